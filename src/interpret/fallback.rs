use crate::instruction::{Instruction, Operation};

/// Keyword-based translation used when no language model is configured or
/// the model call fails.
///
/// Rules are checked in order and the first match wins:
///
/// | keywords        | instruction                                          |
/// |-----------------|------------------------------------------------------|
/// | `trim`, `cut`   | trim 0..30                                           |
/// | `text`, `title` | add_text "Sample Text" at center for 5s              |
/// | `speed`         | speed_change 2.0 with `fast`, otherwise 0.5          |
/// | anything else   | trim 0..10                                           |
pub fn translate(command: &str) -> Instruction {
    let command = command.to_lowercase();
    let has = |keyword: &str| command.contains(keyword);

    if has("trim") || has("cut") {
        trim(0.0, 30.0)
    } else if has("text") || has("title") {
        Instruction::new(Operation::AddText)
            .with_param("text", "Sample Text")
            .with_param("position", "center")
            .with_param("duration", 5.0)
    } else if has("speed") {
        let speed = if has("fast") { 2.0 } else { 0.5 };
        Instruction::new(Operation::SpeedChange).with_param("speed", speed)
    } else {
        trim(0.0, 10.0)
    }
}

fn trim(start: f64, end: f64) -> Instruction {
    Instruction::new(Operation::Trim)
        .with_param("start_time", start)
        .with_param("end_time", end)
}
