// Export components
pub mod assistant;
pub mod auth;
pub mod calendar;
pub mod gpt;
pub mod validator;

// Re-export the pipeline entry points
pub use assistant::{NaturalLanguageHandler, PipelineError, Request, Stage};
pub use auth::{MockAuthService, TokenProvider};
pub use calendar::{CalendarBackend, CalendarService};
pub use gpt::{EventParser, GptService};
pub use validator::{EventRules, EventValidator};
