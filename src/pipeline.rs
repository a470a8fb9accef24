use std::path::Path;
use std::sync::Arc;
use tracing::{Instrument, info, info_span};
use uuid::Uuid;

use crate::config::Config;
use crate::error::{Result, ReelError};
use crate::executor::{EditedVideo, VideoExecutor};
use crate::instruction::{Instruction, VideoMetadata};
use crate::interpret::Interpreter;
use crate::media::{EngineCapability, MediaEngine, MediaEngineFactory};

/// Result of interpreting and applying one command
#[derive(Debug)]
pub struct EditOutcome {
    pub request_id: Uuid,
    pub instruction: Instruction,
    pub video: EditedVideo,
    pub engine_capability: EngineCapability,
}

impl EditOutcome {
    /// User-facing summary of what happened to the video
    pub fn status_message(&self) -> String {
        if self.engine_capability == EngineCapability::PassthroughOnly {
            "Video processing is unavailable; the original video was returned".to_string()
        } else if self.video.was_edited() {
            format!("Applied {}", self.instruction.operation())
        } else {
            format!(
                "Could not apply {}; the original video was returned",
                self.instruction.operation()
            )
        }
    }
}

/// Command interpretation followed by video execution
pub struct Pipeline {
    interpreter: Interpreter,
    executor: VideoExecutor,
}

impl Pipeline {
    /// Build the pipeline, detecting whether ffmpeg is usable
    pub async fn new(config: Config) -> Self {
        let engine = MediaEngineFactory::create(config.media.clone()).await;
        Self::with_engine(config, engine)
    }

    pub fn with_engine(config: Config, engine: Arc<dyn MediaEngine>) -> Self {
        Self {
            interpreter: Interpreter::new(config.interpreter),
            executor: VideoExecutor::new(engine, &config.executor),
        }
    }

    pub fn capability(&self) -> EngineCapability {
        self.executor.capability()
    }

    pub fn is_ai_enabled(&self) -> bool {
        self.interpreter.is_ai_enabled()
    }

    pub async fn interpret(&self, command: &str, metadata: &VideoMetadata) -> Instruction {
        self.interpreter.interpret(command, metadata).await
    }

    pub async fn apply(&self, input: &Path, instruction: &Instruction) -> Result<EditedVideo> {
        if !input.exists() {
            return Err(ReelError::FileNotFound(input.display().to_string()));
        }
        self.executor.execute(input, instruction).await
    }

    /// Interpret `command` and apply the result to `input`
    pub async fn edit(&self, input: &Path, command: &str, metadata: &VideoMetadata) -> Result<EditOutcome> {
        let request_id = Uuid::new_v4();
        let span = info_span!("edit", %request_id);

        async move {
            info!("Editing {} with command: {}", input.display(), command);

            let instruction = self.interpret(command, metadata).await;
            info!("Instruction: {}", instruction);

            let video = self.apply(input, &instruction).await?;
            info!("Output ready at {}", video.path().display());

            Ok(EditOutcome {
                request_id,
                instruction,
                video,
                engine_capability: self.capability(),
            })
        }
        .instrument(span)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instruction::Operation;
    use crate::media::PassthroughEngine;
    use assert_fs::prelude::*;

    fn pipeline(work_dir: &Path) -> Pipeline {
        let mut config = Config::default();
        config.interpreter.api_key = None;
        config.executor.work_dir = Some(work_dir.to_path_buf());
        Pipeline::with_engine(config, Arc::new(PassthroughEngine::new()))
    }

    #[tokio::test]
    async fn test_degraded_edit_reports_passthrough() {
        let temp = assert_fs::TempDir::new().unwrap();
        let input = temp.child("clip.mp4");
        input.write_binary(b"original").unwrap();

        let pipeline = pipeline(temp.path());
        let outcome = pipeline
            .edit(input.path(), "speed it up, fast", &VideoMetadata::new())
            .await
            .unwrap();

        assert_eq!(outcome.instruction.operation(), Operation::SpeedChange);
        assert_eq!(outcome.engine_capability, EngineCapability::PassthroughOnly);
        assert!(outcome.status_message().contains("unavailable"));
        assert_eq!(std::fs::read(outcome.video.path()).unwrap(), b"original");
    }

    #[tokio::test]
    async fn test_missing_input_is_rejected() {
        let temp = assert_fs::TempDir::new().unwrap();
        let pipeline = pipeline(temp.path());

        let result = pipeline
            .edit(&temp.path().join("nope.mp4"), "trim", &VideoMetadata::new())
            .await;
        assert!(matches!(result, Err(ReelError::FileNotFound(_))));
    }
}
