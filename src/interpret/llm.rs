use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use crate::config::InterpreterConfig;
use crate::error::{Result, ReelError};
use crate::instruction::{Instruction, VideoMetadata};

/// Result of one language model attempt.
///
/// Never leaves the interpret module: the interpreter always resolves it to a
/// concrete [`Instruction`].
#[derive(Debug)]
pub(crate) enum TranslationOutcome {
    Parsed(Instruction),
    Failed(String),
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    temperature: f64,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

/// Translates commands through an OpenAI-compatible chat-completion endpoint
pub struct LlmTranslator {
    client: Client,
    config: InterpreterConfig,
}

impl LlmTranslator {
    pub fn new(config: InterpreterConfig) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(secs) = config.request_timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder.build().map_err(ReelError::Http)?;

        Ok(Self { client, config })
    }

    /// Single attempt, no retries
    pub(crate) async fn translate(&self, command: &str, metadata: &VideoMetadata) -> TranslationOutcome {
        match self.request_instruction(command, metadata).await {
            Ok(instruction) => TranslationOutcome::Parsed(instruction),
            Err(e) => TranslationOutcome::Failed(e.to_string()),
        }
    }

    async fn request_instruction(&self, command: &str, metadata: &VideoMetadata) -> Result<Instruction> {
        let api_key = self
            .config
            .credential()
            .ok_or_else(|| ReelError::Interpret("No API key configured".to_string()))?;

        let request = ChatCompletionRequest {
            model: &self.config.model,
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: build_prompt(command, metadata),
            }],
            temperature: self.config.temperature,
        };

        debug!("Sending completion request to: {}", self.config.endpoint);

        let response = self
            .client
            .post(&self.config.endpoint)
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| ReelError::Interpret(format!("HTTP request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(ReelError::Interpret(format!(
                "Completion API error {}: {}",
                status, error_text
            )));
        }

        let completion: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| ReelError::Interpret(format!("Failed to parse response: {}", e)))?;

        let content = completion
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| ReelError::Interpret("Response contained no choices".to_string()))?;

        debug!("Raw model content: {}", content);

        parse_instruction(&content).ok_or_else(|| {
            ReelError::Interpret(format!("Model content is not a valid instruction: {}", content.trim()))
        })
    }
}

fn build_prompt(command: &str, metadata: &VideoMetadata) -> String {
    format!(
        r#"You are a video editing assistant. Parse this command into structured instructions:

Command: "{}"
Video metadata: {}

Return ONLY a JSON object with this structure:
{{
    "operation": "trim|crop|add_text|add_music|speed_change|filter",
    "parameters": {{
        "start_time": 0,
        "end_time": 10,
        "text": "example text",
        "position": "center",
        "duration": 5,
        "speed": 1.5
    }}
}}

Pick exactly one operation and include only the parameters it needs."#,
        command,
        metadata.to_json()
    )
}

/// Parse model output as an instruction, tolerating code fences and
/// surrounding prose
fn parse_instruction(content: &str) -> Option<Instruction> {
    let text = content.trim();

    if let Ok(instruction) = Instruction::from_json(text) {
        return Some(instruction);
    }

    let unfenced = strip_code_fence(text);
    if unfenced != text {
        if let Ok(instruction) = Instruction::from_json(unfenced) {
            return Some(instruction);
        }
    }

    let start = unfenced.find('{')?;
    let end = unfenced.rfind('}')?;
    if start >= end {
        return None;
    }
    Instruction::from_json(&unfenced[start..=end]).ok()
}

fn strip_code_fence(text: &str) -> &str {
    let Some(inner) = text.strip_prefix("```").and_then(|t| t.strip_suffix("```")) else {
        return text;
    };
    inner.strip_prefix("json").unwrap_or(inner).trim()
}
