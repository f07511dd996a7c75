mod backend;
pub mod fallback;
mod prompt;

pub use backend::CompletionBackend;
#[cfg(feature = "openai")]
pub use backend::OpenAiBackend;
pub use prompt::{PromptLanguage, PromptTemplate, SYSTEM_PREAMBLE};

use crate::components::calendar::Event;
use crate::config::Config;
use crate::error::AssistantResult;
use async_trait::async_trait;
use chrono::Utc;
use chrono_tz::Tz;
use serde_json::{from_str, from_value, Value};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info, warn};

/// Reasons a model answer could not be turned into an event
#[derive(Debug, Clone, Error, PartialEq)]
pub enum GptError {
    #[error("no model credential configured")]
    MissingCredential,

    #[error("completion request failed: {0}")]
    Request(String),

    #[error("empty response from model")]
    EmptyResponse,

    #[error("could not extract valid JSON from the model response: {0}")]
    InvalidJson(String),

    #[error("model response is missing required field '{0}'")]
    MissingField(&'static str),
}

/// Which path produced a parsed event
#[derive(Debug, Clone, PartialEq)]
pub enum Origin {
    /// Answer of the language model
    Model,
    /// Mock generator, no credential configured
    Offline,
    /// Mock generator after a failed live call
    Fallback(GptError),
}

/// Event plus the path that produced it
#[derive(Debug, Clone)]
pub struct ParseOutcome {
    pub event: Event,
    pub origin: Origin,
}

/// Turns free text into an event
#[async_trait]
pub trait EventParser: Send + Sync {
    async fn parse_to_event(&self, input: &str) -> Result<Event, GptError>;
}

#[derive(Clone)]
enum Mode {
    Offline,
    Live(Arc<dyn CompletionBackend>),
}

/// Natural language parser backed by a completion model
///
/// Never fails towards its caller: without a credential, or when the call
/// or its answer is unusable, the deterministic mock event is returned.
#[derive(Clone)]
pub struct GptService {
    mode: Mode,
    template: PromptTemplate,
    zone: Tz,
}

impl GptService {
    /// Service that never calls a model
    pub fn offline() -> Self {
        Self {
            mode: Mode::Offline,
            template: PromptTemplate::default(),
            zone: Tz::UTC,
        }
    }

    /// Service calling the given backend
    pub fn live(backend: Arc<dyn CompletionBackend>) -> Self {
        Self {
            mode: Mode::Live(backend),
            ..Self::offline()
        }
    }

    /// Build the service the configuration asks for
    pub fn from_config(config: &Config) -> AssistantResult<Self> {
        let service = match config.openai_api_key.as_deref() {
            #[cfg(feature = "openai")]
            Some(api_key) => Self::live(Arc::new(OpenAiBackend::new(
                api_key,
                config.openai_base_url.as_deref(),
                &config.openai_model,
                config.openai_temperature,
            ))),
            #[cfg(not(feature = "openai"))]
            Some(_) => {
                warn!("OPENAI_API_KEY is set but the openai feature is disabled, running offline");
                Self::offline()
            }
            None => {
                info!("No model credential configured, running offline");
                Self::offline()
            }
        };

        Ok(service
            .with_template(config.prompt_language.template())
            .with_zone(config.tz()?))
    }

    /// Use a different instruction template
    pub fn with_template(mut self, template: PromptTemplate) -> Self {
        self.template = template;
        self
    }

    /// Zone used for the reference date in the prompt
    pub fn with_zone(mut self, zone: Tz) -> Self {
        self.zone = zone;
        self
    }

    pub fn is_offline(&self) -> bool {
        matches!(self.mode, Mode::Offline)
    }

    /// Parse the input and report which path produced the event
    pub async fn parse(&self, input: &str) -> ParseOutcome {
        let backend = match &self.mode {
            Mode::Offline => {
                debug!("Offline mode, generating mock event");
                return ParseOutcome {
                    event: fallback::mock_event(input, Utc::now()),
                    origin: Origin::Offline,
                };
            }
            Mode::Live(backend) => backend,
        };

        match self.ask_model(backend.as_ref(), input).await {
            Ok(event) => ParseOutcome {
                event,
                origin: Origin::Model,
            },
            Err(e) => {
                warn!("Model parsing failed, using mock event: {}", e);
                ParseOutcome {
                    event: fallback::mock_event(input, Utc::now()),
                    origin: Origin::Fallback(e),
                }
            }
        }
    }

    async fn ask_model(
        &self,
        backend: &dyn CompletionBackend,
        input: &str,
    ) -> Result<Event, GptError> {
        let today = Utc::now().with_timezone(&self.zone).date_naive();
        let prompt = self.template.render(input, today);

        let response = backend.complete(&prompt).await?;
        if response.trim().is_empty() {
            return Err(GptError::EmptyResponse);
        }

        event_from_response(&response)
    }
}

impl Default for GptService {
    fn default() -> Self {
        Self::offline()
    }
}

#[async_trait]
impl EventParser for GptService {
    async fn parse_to_event(&self, input: &str) -> Result<Event, GptError> {
        Ok(self.parse(input).await.event)
    }
}

/// Extract and check the event object in a model answer
pub fn event_from_response(response: &str) -> Result<Event, GptError> {
    let value = parse_json_from_response(response)?;

    for field in ["summary", "start", "end"] {
        if !value.get(field).is_some_and(is_truthy) {
            return Err(GptError::MissingField(field));
        }
    }

    from_value::<Event>(value).map_err(|e| GptError::InvalidJson(e.to_string()))
}

/// Attempt to parse a JSON object from the model response
fn parse_json_from_response(response: &str) -> Result<Value, GptError> {
    // Outermost object first, tolerating prose around it
    if let (Some(start), Some(end)) = (response.find('{'), response.rfind('}')) {
        if start < end {
            let json_str = &response[start..=end];
            match from_str::<Value>(json_str) {
                Ok(value) if value.is_object() => return Ok(value),
                Ok(_) => {}
                Err(e) => debug!("Failed to parse extracted JSON: {}", e),
            }
        }
    }

    match from_str::<Value>(response.trim()) {
        Ok(value) if value.is_object() => Ok(value),
        Ok(_) => Err(GptError::InvalidJson("response is not a JSON object".to_string())),
        Err(e) => {
            error!("Could not extract valid JSON from response: {}", response);
            Err(GptError::InvalidJson(e.to_string()))
        }
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
