use calendar_assistant::components::auth::{MockAuthService, TokenProvider, GRANTED_SCOPES};
use calendar_assistant::components::calendar::{CalendarBackend, CalendarService, Event, ListOptions};
use calendar_assistant::components::gpt::{GptService, Origin, PromptLanguage};
use calendar_assistant::config::Config;
use std::sync::Arc;

/// Smoke test to verify that a config can be built and checked
#[tokio::test]
async fn test_config_defaults_are_valid() {
    let config = Config {
        port: 8080,
        timezone: "Asia/Tokyo".to_string(),
        prompt_language: PromptLanguage::English,
        ..Default::default()
    };

    assert!(config.validate().is_ok());
    assert_eq!(config.bind_address(), "127.0.0.1:8080");
    assert!(!config.is_online());
    assert_eq!(config.tz().unwrap(), chrono_tz::Asia::Tokyo);
}

/// Smoke test for the mock auth service
#[tokio::test]
async fn test_mock_auth_grants_calendar_scopes() {
    let auth = MockAuthService::new();

    let token = auth.get_access_token("alice").await.unwrap();
    assert!(token.starts_with("mock-access-token-alice-"));

    let scopes = auth.get_user_scopes("alice").await.unwrap();
    assert_eq!(scopes.len(), GRANTED_SCOPES.len());
    assert!(auth
        .has_required_permissions("alice", &GRANTED_SCOPES)
        .await
        .unwrap());
    assert!(auth.verify_user_authentication("alice").await.unwrap());
}

/// Smoke test for the calendar service round of operations
#[tokio::test]
async fn test_calendar_service_operations() {
    let calendar = CalendarService::new(Arc::new(MockAuthService::new()));
    let event = Event {
        summary: Some("Standup".to_string()),
        ..Default::default()
    };

    let id = calendar.create_event("alice", &event).await.unwrap();
    assert!(id.starts_with("mock-event-id-"));

    let updated = calendar.update_event("alice", "evt-9", &event).await.unwrap();
    assert_eq!(updated, "evt-9");

    assert!(calendar.delete_event("alice", "evt-9").await.is_ok());

    let events = calendar
        .get_events("alice", &ListOptions::default())
        .await
        .unwrap();
    assert!(events.is_empty());
}

/// Offline parsing works without any credential
#[tokio::test]
async fn test_offline_parser() {
    let service = GptService::from_config(&Config::default()).unwrap();
    let outcome = service.parse("Team lunch on Friday").await;

    assert_eq!(outcome.origin, Origin::Offline);
    assert_eq!(
        outcome.event.summary.as_deref(),
        Some("Event from: Team lunch on Friday")
    );
}
