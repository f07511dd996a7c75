use super::GptError;
use async_trait::async_trait;

/// A single prompt-in, text-out model call
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, GptError>;
}

#[cfg(feature = "openai")]
pub use openai::OpenAiBackend;

#[cfg(feature = "openai")]
mod openai {
    use super::{CompletionBackend, GptError};
    use crate::components::gpt::prompt::SYSTEM_PREAMBLE;
    use async_trait::async_trait;
    use rig::completion::{Chat, Message};
    use rig::providers::openai::Client as OpenAiClient;
    use serde_json::json;
    use tracing::info;

    /// Chat completion through the OpenAI provider of rig
    pub struct OpenAiBackend {
        client: OpenAiClient,
        model: String,
        temperature: f64,
    }

    impl OpenAiBackend {
        pub fn new(api_key: &str, base_url: Option<&str>, model: &str, temperature: f64) -> Self {
            let client = match base_url {
                Some(url) => OpenAiClient::from_url(api_key, url),
                None => OpenAiClient::new(api_key),
            };

            Self {
                client,
                model: model.to_string(),
                temperature,
            }
        }
    }

    #[async_trait]
    impl CompletionBackend for OpenAiBackend {
        async fn complete(&self, prompt: &str) -> Result<String, GptError> {
            info!("Requesting completion from model {}", self.model);

            let agent = self
                .client
                .agent(&self.model)
                .preamble(SYSTEM_PREAMBLE)
                .temperature(self.temperature)
                .additional_params(json!({ "response_format": { "type": "json_object" } }))
                .build();

            let response = agent
                .chat(prompt.to_string(), Vec::<Message>::new())
                .await
                .map_err(|e| GptError::Request(e.to_string()))?;

            info!("Received response from model");
            Ok(response)
        }
    }
}
