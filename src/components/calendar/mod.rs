pub mod models;

pub use models::{Attendee, AttendeeRecord, Event, EventStatus, EventTime, EventUpdate, ListOptions};

use crate::components::auth::{AuthError, MockAuthService, TokenProvider, SCOPE_CALENDAR_EVENTS};
use crate::utils::time::epoch_millis;
use async_trait::async_trait;
use chrono::Utc;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

/// Calendar operation, used to tag failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Create,
    Update,
    Delete,
    List,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operation::Create => "create",
            Operation::Update => "update",
            Operation::Delete => "delete",
            Operation::List => "get events",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum CalendarError {
    #[error("CalendarService {operation} error: {source}")]
    Auth {
        operation: Operation,
        #[source]
        source: AuthError,
    },

    #[error("CalendarService {operation} error: missing permission for user {user_id}")]
    PermissionDenied { operation: Operation, user_id: String },

    #[error("CalendarService {operation} error: {message}")]
    Backend { operation: Operation, message: String },
}

impl CalendarError {
    /// Operation that failed
    pub fn operation(&self) -> Operation {
        match self {
            CalendarError::Auth { operation, .. }
            | CalendarError::PermissionDenied { operation, .. }
            | CalendarError::Backend { operation, .. } => *operation,
        }
    }
}

/// The four operations any calendar backend must offer
#[async_trait]
pub trait CalendarBackend: Send + Sync {
    /// Create an event, returning the backend's id for it
    async fn create_event(&self, user_id: &str, event: &Event) -> Result<String, CalendarError>;

    /// Replace an event, returning its id
    async fn update_event(
        &self,
        user_id: &str,
        event_id: &str,
        event: &Event,
    ) -> Result<String, CalendarError>;

    /// Delete an event
    async fn delete_event(&self, user_id: &str, event_id: &str) -> Result<(), CalendarError>;

    /// List events matching the options
    async fn get_events(
        &self,
        user_id: &str,
        options: &ListOptions,
    ) -> Result<Vec<Event>, CalendarError>;
}

/// Calendar service backed by a mock store
///
/// Each operation fetches a token, checks the events scope and then performs
/// a logged placeholder action. Nothing is retained between calls.
#[derive(Clone)]
pub struct CalendarService {
    auth: Arc<dyn TokenProvider>,
}

impl Default for CalendarService {
    fn default() -> Self {
        Self::new(Arc::new(MockAuthService::new()))
    }
}

impl CalendarService {
    /// Create a service using the given token provider
    pub fn new(auth: Arc<dyn TokenProvider>) -> Self {
        Self { auth }
    }

    /// Obtain a token and make sure the user may touch events
    async fn authorize(&self, user_id: &str, operation: Operation) -> Result<String, CalendarError> {
        let token = self
            .auth
            .get_access_token(user_id)
            .await
            .map_err(|source| CalendarError::Auth { operation, source })?;

        let permitted = self
            .auth
            .has_required_permissions(user_id, &[SCOPE_CALENDAR_EVENTS])
            .await
            .map_err(|source| CalendarError::Auth { operation, source })?;

        if !permitted {
            return Err(CalendarError::PermissionDenied {
                operation,
                user_id: user_id.to_string(),
            });
        }

        Ok(token)
    }
}

#[async_trait]
impl CalendarBackend for CalendarService {
    async fn create_event(&self, user_id: &str, event: &Event) -> Result<String, CalendarError> {
        let token = self.authorize(user_id, Operation::Create).await?;

        debug!("Mock: Creating event with access token: {}", token);
        debug!("Mock: Event data: {:?}", event);

        let event_id = format!("mock-event-id-{}", epoch_millis(&Utc::now()));
        info!("Created event {} for user {}", event_id, user_id);
        Ok(event_id)
    }

    async fn update_event(
        &self,
        user_id: &str,
        event_id: &str,
        event: &Event,
    ) -> Result<String, CalendarError> {
        let token = self.authorize(user_id, Operation::Update).await?;

        debug!("Mock: Updating event {} with access token: {}", event_id, token);
        debug!("Mock: Updated event data: {:?}", event);

        info!("Updated event {} for user {}", event_id, user_id);
        Ok(event_id.to_string())
    }

    async fn delete_event(&self, user_id: &str, event_id: &str) -> Result<(), CalendarError> {
        let token = self.authorize(user_id, Operation::Delete).await?;

        debug!("Mock: Deleting event {} with access token: {}", event_id, token);
        info!("Deleted event {} for user {}", event_id, user_id);
        Ok(())
    }

    async fn get_events(
        &self,
        user_id: &str,
        options: &ListOptions,
    ) -> Result<Vec<Event>, CalendarError> {
        let token = self.authorize(user_id, Operation::List).await?;

        debug!("Mock: Getting events with options: {:?}", options);
        debug!("Mock: Using access token: {}", token);
        Ok(Vec::new())
    }
}
