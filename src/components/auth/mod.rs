use crate::utils::time::epoch_millis;
use async_trait::async_trait;
use chrono::Utc;
use thiserror::Error;
use tracing::debug;

/// Full read/write access to calendars
pub const SCOPE_CALENDAR: &str = "https://www.googleapis.com/auth/calendar";
/// Read/write access to events
pub const SCOPE_CALENDAR_EVENTS: &str = "https://www.googleapis.com/auth/calendar.events";
pub const SCOPE_USERINFO_EMAIL: &str = "https://www.googleapis.com/auth/userinfo.email";
pub const SCOPE_USERINFO_PROFILE: &str = "https://www.googleapis.com/auth/userinfo.profile";

/// Scopes granted to every user by the mock provider
pub const GRANTED_SCOPES: [&str; 4] = [
    SCOPE_CALENDAR,
    SCOPE_CALENDAR_EVENTS,
    SCOPE_USERINFO_EMAIL,
    SCOPE_USERINFO_PROFILE,
];

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("AuthService token retrieval error: {0}")]
    Token(String),

    #[error("AuthService verification error: {0}")]
    Verification(String),

    #[error("AuthService token refresh error: {0}")]
    Refresh(String),

    #[error("AuthService scope retrieval error: {0}")]
    Scopes(String),
}

/// Source of access tokens and scopes for a user
#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// Access token for the calendar API
    async fn get_access_token(&self, user_id: &str) -> Result<String, AuthError>;

    /// Whether the user is known and active
    async fn verify_user_authentication(&self, user_id: &str) -> Result<bool, AuthError>;

    /// Exchange a refresh token for a new access token
    async fn refresh_access_token(
        &self,
        user_id: &str,
        refresh_token: &str,
    ) -> Result<String, AuthError>;

    /// OAuth scopes granted to the user
    async fn get_user_scopes(&self, user_id: &str) -> Result<Vec<String>, AuthError>;

    /// Whether every scope in `required` has been granted
    async fn has_required_permissions(
        &self,
        user_id: &str,
        required: &[&str],
    ) -> Result<bool, AuthError> {
        let scopes = self.get_user_scopes(user_id).await?;
        Ok(required
            .iter()
            .all(|scope| scopes.iter().any(|granted| granted == scope)))
    }
}

/// Stand-in for the identity platform
///
/// Issues synthetic tokens and the fixed [`GRANTED_SCOPES`] for any user id.
#[derive(Debug, Clone, Default)]
pub struct MockAuthService;

impl MockAuthService {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl TokenProvider for MockAuthService {
    async fn get_access_token(&self, user_id: &str) -> Result<String, AuthError> {
        debug!("Mock: Getting access token for user: {}", user_id);
        Ok(format!(
            "mock-access-token-{}-{}",
            user_id,
            epoch_millis(&Utc::now())
        ))
    }

    async fn verify_user_authentication(&self, user_id: &str) -> Result<bool, AuthError> {
        debug!("Mock: Verifying authentication for user: {}", user_id);
        Ok(true)
    }

    async fn refresh_access_token(
        &self,
        user_id: &str,
        refresh_token: &str,
    ) -> Result<String, AuthError> {
        debug!(
            "Mock: Refreshing token for user: {} (refresh token length {})",
            user_id,
            refresh_token.len()
        );
        Ok(format!(
            "mock-refreshed-access-token-{}-{}",
            user_id,
            epoch_millis(&Utc::now())
        ))
    }

    async fn get_user_scopes(&self, user_id: &str) -> Result<Vec<String>, AuthError> {
        debug!("Mock: Getting scopes for user: {}", user_id);
        Ok(GRANTED_SCOPES.iter().map(|s| s.to_string()).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_token_embeds_user() {
        let auth = MockAuthService::new();
        let token = auth.get_access_token("user-1").await.unwrap();
        assert!(token.starts_with("mock-access-token-user-1-"));

        let refreshed = auth.refresh_access_token("user-1", "refresh").await.unwrap();
        assert!(refreshed.starts_with("mock-refreshed-access-token-user-1-"));
    }

    #[tokio::test]
    async fn test_permissions_against_granted_scopes() {
        let auth = MockAuthService::new();
        assert_eq!(auth.get_user_scopes("u").await.unwrap().len(), 4);
        assert!(auth
            .has_required_permissions("u", &[SCOPE_CALENDAR, SCOPE_CALENDAR_EVENTS])
            .await
            .unwrap());
        assert!(auth.has_required_permissions("u", &[]).await.unwrap());
        assert!(!auth
            .has_required_permissions("u", &["https://www.googleapis.com/auth/gmail.send"])
            .await
            .unwrap());
        assert!(auth.verify_user_authentication("u").await.unwrap());
    }
}
