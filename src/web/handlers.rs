use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use serde_json::Value;
use tracing::info;

use super::responses::{
    is_schedulable, text_from_body, update_from_body, ApiError, HealthResponse, SuccessResponse,
    ValidationResponse,
};
use super::AppState;
use crate::components::assistant::NaturalLanguageHandler;
use crate::components::auth::MockAuthService;
use crate::components::calendar::{CalendarBackend, CalendarService, ListOptions};
use crate::utils::time::to_iso_utc;
use std::sync::Arc;

/// Header carrying the caller's user id
pub const USER_ID_HEADER: &str = "user-id";

/// Summary used by PATCH when the update has no title
const UPDATED_EVENT_SUMMARY: &str = "Updated Event";

/// User id from the request headers, or the configured default
pub fn user_id(headers: &HeaderMap, state: &AppState) -> String {
    headers
        .get(USER_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| state.config.default_user_id.clone())
}

fn calendar_service() -> CalendarService {
    CalendarService::new(Arc::new(MockAuthService::new()))
}

fn pipeline(state: &AppState, error: &'static str) -> Result<NaturalLanguageHandler, ApiError> {
    NaturalLanguageHandler::from_config(&state.config).map_err(|e| ApiError::failed(error, e))
}

/// Handler for the health check
pub async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp: to_iso_utc(&Utc::now()),
        version: env!("CARGO_PKG_VERSION").to_string(),
        environment: state.config.environment.clone(),
    })
}

/// Check whether a text could be scheduled, without creating anything
pub async fn validate_schedule_handler(
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<ValidationResponse>, ApiError> {
    let Json(body) = body?;
    let text = text_from_body(&body)?;

    let valid = is_schedulable(&text);
    let message = if valid {
        "Event can be created"
    } else {
        "Failed to parse natural language input"
    };

    Ok(Json(ValidationResponse {
        valid,
        message: message.to_string(),
    }))
}

/// List events for the caller
pub async fn list_events_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(options): Query<ListOptions>,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = user_id(&headers, &state);
    info!("Listing events for user {}", user_id);

    let events = calendar_service()
        .get_events(&user_id, &options)
        .await
        .map_err(|e| ApiError::failed("Failed to fetch calendar events", e))?;

    Ok(Json(events))
}

/// Apply a structured update and return the stored event
pub async fn patch_schedule_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(event_id): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(body) = body?;
    let update = update_from_body(body)?;
    let user_id = user_id(&headers, &state);

    let event = update.into_event(&event_id, UPDATED_EVENT_SUMMARY, Utc::now());
    calendar_service()
        .update_event(&user_id, &event_id, &event)
        .await
        .map_err(|e| ApiError::failed("Failed to update calendar event", e))?;

    Ok(Json(event))
}

/// Delete an event through the calendar service
pub async fn delete_schedule_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(event_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = user_id(&headers, &state);

    calendar_service()
        .delete_event(&user_id, &event_id)
        .await
        .map_err(|e| ApiError::failed("Failed to delete calendar event", e))?;

    Ok(Json(SuccessResponse::done("Operation completed successfully")))
}

/// Create an event from natural language
pub async fn create_event_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    const FAILURE: &str = "Failed to create calendar event";

    let Json(body) = body?;
    let text = text_from_body(&body)?;
    let user_id = user_id(&headers, &state);

    let event = pipeline(&state, FAILURE)?
        .handle_request(&text, &user_id)
        .await
        .map_err(|e| ApiError::failed(FAILURE, e))?;

    Ok((
        StatusCode::CREATED,
        Json(SuccessResponse::with_data(
            "Calendar event created successfully",
            event,
        )),
    ))
}

/// Replace an event from a structured update or from natural language
pub async fn update_event_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(event_id): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    const FAILURE: &str = "Failed to update calendar event";

    let Json(body) = body?;
    let user_id = user_id(&headers, &state);

    let event = if body.get("text").is_some() {
        let text = text_from_body(&body)?;
        pipeline(&state, FAILURE)?
            .handle_update_request(&event_id, &text, &user_id)
            .await
            .map_err(|e| ApiError::failed(FAILURE, e))?
    } else {
        let update = update_from_body(body)?;
        let event = update.into_event(&event_id, "", Utc::now());
        calendar_service()
            .update_event(&user_id, &event_id, &event)
            .await
            .map_err(|e| ApiError::failed(FAILURE, e))?;
        event
    };

    Ok(Json(SuccessResponse::with_data(
        "Calendar event updated successfully",
        event,
    )))
}

/// Delete an event through the natural language handler
pub async fn delete_event_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(event_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    const FAILURE: &str = "Failed to delete calendar event";

    let user_id = user_id(&headers, &state);
    pipeline(&state, FAILURE)?
        .handle_delete_request(&event_id, &user_id)
        .await
        .map_err(|e| ApiError::failed(FAILURE, e))?;

    Ok(Json(SuccessResponse::done("Calendar event deleted successfully")))
}
