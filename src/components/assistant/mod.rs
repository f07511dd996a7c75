use crate::components::auth::MockAuthService;
use crate::components::calendar::{CalendarBackend, CalendarError, CalendarService, Event};
use crate::components::gpt::{EventParser, GptError, GptService};
use crate::components::validator::{EventRules, EventValidator, ValidationError};
use crate::config::Config;
use crate::error::AssistantResult;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info};

/// Pipeline stage a request failed in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Parsing,
    Validating,
    Normalizing,
    Persisting,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Parsing => "parsing",
            Stage::Validating => "validating",
            Stage::Normalizing => "normalizing",
            Stage::Persisting => "persisting",
        };
        f.write_str(name)
    }
}

/// Handler entry point a failure happened in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Request {
    Create,
    Update,
    Delete,
}

impl Request {
    fn prefix(&self) -> &'static str {
        match self {
            Request::Create => "NaturalLanguageHandler error:",
            Request::Update => "NaturalLanguageHandler update error:",
            Request::Delete => "NaturalLanguageHandler delete error:",
        }
    }
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("{} {source}", .request.prefix())]
    Parse {
        request: Request,
        #[source]
        source: GptError,
    },

    #[error("{} {source}", .request.prefix())]
    Validate {
        request: Request,
        #[source]
        source: ValidationError,
    },

    #[error("{} {source}", .request.prefix())]
    Normalize {
        request: Request,
        #[source]
        source: ValidationError,
    },

    #[error("{} {source}", .request.prefix())]
    Persist {
        request: Request,
        #[source]
        source: CalendarError,
    },
}

impl PipelineError {
    pub fn stage(&self) -> Stage {
        match self {
            PipelineError::Parse { .. } => Stage::Parsing,
            PipelineError::Validate { .. } => Stage::Validating,
            PipelineError::Normalize { .. } => Stage::Normalizing,
            PipelineError::Persist { .. } => Stage::Persisting,
        }
    }

    pub fn request(&self) -> Request {
        match self {
            PipelineError::Parse { request, .. }
            | PipelineError::Validate { request, .. }
            | PipelineError::Normalize { request, .. }
            | PipelineError::Persist { request, .. } => *request,
        }
    }
}

/// Orchestrates parse, validate, normalize and persist
///
/// Stages run strictly in order and the first failure ends the request.
/// Nothing is retried and a created event is never rolled back.
#[derive(Clone)]
pub struct NaturalLanguageHandler {
    parser: Arc<dyn EventParser>,
    rules: Arc<dyn EventRules>,
    calendar: Arc<dyn CalendarBackend>,
}

impl NaturalLanguageHandler {
    pub fn new(
        parser: Arc<dyn EventParser>,
        rules: Arc<dyn EventRules>,
        calendar: Arc<dyn CalendarBackend>,
    ) -> Self {
        Self {
            parser,
            rules,
            calendar,
        }
    }

    /// Wire the production services from configuration
    pub fn from_config(config: &Config) -> AssistantResult<Self> {
        let parser = GptService::from_config(config)?;
        let rules = EventValidator::new().with_default_zone(config.tz()?);
        let calendar = CalendarService::new(Arc::new(MockAuthService::new()));

        Ok(Self::new(Arc::new(parser), Arc::new(rules), Arc::new(calendar)))
    }

    /// Turn free text into a validated event and create it
    pub async fn handle_request(&self, text: &str, user_id: &str) -> Result<Event, PipelineError> {
        info!("Handling schedule request for user {}", user_id);

        let request = Request::Create;
        let mut event = self.prepare(request, text).await?;
        let event_id = self
            .calendar
            .create_event(user_id, &event)
            .await
            .map_err(|source| self.fail(PipelineError::Persist { request, source }))?;

        info!("Created event {} for user {}", event_id, user_id);
        event.id = Some(event_id);
        Ok(event)
    }

    /// Turn free text into a validated event and replace `event_id` with it
    pub async fn handle_update_request(
        &self,
        event_id: &str,
        text: &str,
        user_id: &str,
    ) -> Result<Event, PipelineError> {
        info!("Handling update request for event {} of user {}", event_id, user_id);

        let request = Request::Update;
        let mut event = self.prepare(request, text).await?;
        let updated_id = self
            .calendar
            .update_event(user_id, event_id, &event)
            .await
            .map_err(|source| self.fail(PipelineError::Persist { request, source }))?;

        event.id = Some(updated_id);
        Ok(event)
    }

    /// Delete an event, no parsing involved
    pub async fn handle_delete_request(
        &self,
        event_id: &str,
        user_id: &str,
    ) -> Result<(), PipelineError> {
        info!("Handling delete request for event {} of user {}", event_id, user_id);

        self.calendar
            .delete_event(user_id, event_id)
            .await
            .map_err(|source| {
                self.fail(PipelineError::Persist {
                    request: Request::Delete,
                    source,
                })
            })
    }

    async fn prepare(&self, request: Request, text: &str) -> Result<Event, PipelineError> {
        debug!("Stage {}", Stage::Parsing);
        let event = self
            .parser
            .parse_to_event(text)
            .await
            .map_err(|source| self.fail(PipelineError::Parse { request, source }))?;

        debug!("Stage {}", Stage::Validating);
        let event = self
            .rules
            .validate(event)
            .map_err(|source| self.fail(PipelineError::Validate { request, source }))?;

        debug!("Stage {}", Stage::Normalizing);
        self.rules
            .normalize_dates(event)
            .map_err(|source| self.fail(PipelineError::Normalize { request, source }))
    }

    fn fail(&self, err: PipelineError) -> PipelineError {
        error!("Request failed while {}: {}", err.stage(), err);
        err
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::calendar::Operation;

    #[test]
    fn test_error_prefix_and_stage() {
        let err = PipelineError::Validate {
            request: Request::Create,
            source: ValidationError::MissingSummary,
        };
        assert_eq!(
            err.to_string(),
            "NaturalLanguageHandler error: Event summary is required"
        );
        assert_eq!(err.stage(), Stage::Validating);

        let err = PipelineError::Persist {
            request: Request::Create,
            source: CalendarError::Backend {
                operation: Operation::Create,
                message: "quota exceeded".to_string(),
            },
        };
        assert_eq!(
            err.to_string(),
            "NaturalLanguageHandler error: CalendarService create error: quota exceeded"
        );
        assert_eq!(err.stage(), Stage::Persisting);
    }

    #[test]
    fn test_update_and_delete_prefixes() {
        let err = PipelineError::Parse {
            request: Request::Update,
            source: GptError::EmptyResponse,
        };
        assert_eq!(
            err.to_string(),
            "NaturalLanguageHandler update error: empty response from model"
        );
        assert_eq!(err.request(), Request::Update);

        let err = PipelineError::Persist {
            request: Request::Delete,
            source: CalendarError::Backend {
                operation: Operation::Delete,
                message: "gone".to_string(),
            },
        };
        assert_eq!(
            err.to_string(),
            "NaturalLanguageHandler delete error: CalendarService delete error: gone"
        );
    }

    #[tokio::test]
    async fn test_offline_pipeline_creates_event() {
        let handler = NaturalLanguageHandler::from_config(&Config::default()).unwrap();
        let event = handler
            .handle_request("Schedule a meeting tomorrow at 2 PM", "user-1")
            .await
            .unwrap();

        assert!(event.id.as_deref().unwrap().starts_with("mock-event-id-"));
        let start = event.start.unwrap().date_time.unwrap();
        assert!(start.ends_with('Z'));
    }

    #[tokio::test]
    async fn test_update_keeps_event_id() {
        let handler = NaturalLanguageHandler::from_config(&Config::default()).unwrap();
        let event = handler
            .handle_update_request("evt-42", "Move standup", "user-1")
            .await
            .unwrap();
        assert_eq!(event.id.as_deref(), Some("evt-42"));
    }
}
