// Command interpretation
//
// Turns free-form command text into an Instruction:
// - Fallback: deterministic keyword rules, always available
// - Llm: remote chat-completion model, used when a credential is configured
//
// Interpretation never fails. Any language model problem is logged and the
// keyword rules answer instead.

pub mod fallback;
pub mod llm;

use tracing::{info, warn};

use crate::config::InterpreterConfig;
use crate::instruction::{Instruction, VideoMetadata};
use llm::{LlmTranslator, TranslationOutcome};

/// Single entry point from command text to instruction
pub struct Interpreter {
    llm: Option<LlmTranslator>,
}

impl Interpreter {
    pub fn new(config: InterpreterConfig) -> Self {
        let llm = if config.credential().is_none() {
            info!("No language model credential configured, using keyword interpretation");
            None
        } else {
            match LlmTranslator::new(config) {
                Ok(translator) => Some(translator),
                Err(e) => {
                    warn!("Failed to initialize language model client, using keyword interpretation: {}", e);
                    None
                }
            }
        };

        Self { llm }
    }

    /// Whether commands are sent to the language model
    pub fn is_ai_enabled(&self) -> bool {
        self.llm.is_some()
    }

    /// Translate a command into an instruction
    pub async fn interpret(&self, command: &str, metadata: &VideoMetadata) -> Instruction {
        let Some(llm) = &self.llm else {
            return fallback::translate(command);
        };

        match llm.translate(command, metadata).await {
            TranslationOutcome::Parsed(instruction) => {
                info!("Language model interpreted command as: {}", instruction);
                instruction
            }
            TranslationOutcome::Failed(reason) => {
                warn!("AI parsing failed, using keyword interpretation: {}", reason);
                fallback::translate(command)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::instruction::Operation;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config_for(server: &MockServer) -> InterpreterConfig {
        let mut config = Config::default().interpreter;
        config.endpoint = format!("{}/chat", server.uri());
        config.api_key = Some("key".to_string());
        config
    }

    #[tokio::test]
    async fn test_no_credential_uses_keywords_without_network() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let mut config = config_for(&server);
        config.api_key = None;
        let interpreter = Interpreter::new(config);

        assert!(!interpreter.is_ai_enabled());
        let instruction = interpreter
            .interpret("trim the intro", &VideoMetadata::new().with("duration", 60))
            .await;
        assert_eq!(instruction.operation(), Operation::Trim);
        assert_eq!(instruction.number("end_time"), Some(30.0));
    }

    #[tokio::test]
    async fn test_provider_error_falls_back() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .expect(1)
            .mount(&server)
            .await;

        let interpreter = Interpreter::new(config_for(&server));
        assert!(interpreter.is_ai_enabled());

        let instruction = interpreter
            .interpret("add a title saying hello", &VideoMetadata::new())
            .await;
        assert_eq!(instruction, fallback::translate("add a title saying hello"));
        assert_eq!(instruction.text("text"), Some("Sample Text"));
    }

    #[tokio::test]
    async fn test_model_answer_wins_over_keywords() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{"message": {"role": "assistant", "content":
                    "{\"operation\":\"trim\",\"parameters\":{\"start_time\":0,\"end_time\":10}}"}}]
            })))
            .mount(&server)
            .await;

        let interpreter = Interpreter::new(config_for(&server));
        let instruction = interpreter
            .interpret("trim the first 10 seconds", &VideoMetadata::new())
            .await;
        assert_eq!(instruction.operation(), Operation::Trim);
        assert_eq!(instruction.number("end_time"), Some(10.0));
    }
}
