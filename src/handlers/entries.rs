use axum::{extract::State, http::StatusCode, Extension, Json};
use chrono::Utc;
use validator::Validate;

use crate::auth::middleware::AuthUser;
use crate::dto::{ClearEntriesResponse, CountResponse, LiveEvent};
use crate::error::{AppError, AppResult};
use crate::handlers::analytics::resolve_timezone;
use crate::models::mood::Mood;
use crate::models::mood_entry::{CreateEntryRequest, MoodEntry, NewMoodEntry};
use crate::AppState;

pub async fn create_entry(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Json(body): Json<CreateEntryRequest>,
) -> AppResult<(StatusCode, Json<MoodEntry>)> {
    body.validate()?;
    let mood = body
        .main_mood
        .parse::<Mood>()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let tz = resolve_timezone(&state.config, body.timezone.as_deref())?;
    let timestamp = body.resolve_timestamp(&tz, Utc::now());

    let entry = state
        .moods
        .create_entry(
            auth_user.id,
            NewMoodEntry::new(timestamp, mood, body.sub_mood, body.notes),
        )
        .await?;

    tracing::info!(user_id = %auth_user.id, entry_id = %entry.id, mood = %entry.main_mood, "Mood entry created");
    // No subscribers is fine.
    let _ = state.ws_tx.send(LiveEvent::EntryCreated {
        user_id: auth_user.id,
        entry: entry.clone(),
    });

    Ok((StatusCode::CREATED, Json(entry)))
}

pub async fn list_entries(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> AppResult<Json<Vec<MoodEntry>>> {
    let entries = state.moods.fetch_entries(auth_user.id).await?;
    Ok(Json(entries))
}

pub async fn count_entries(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> AppResult<Json<CountResponse>> {
    let count = state.moods.count_entries(auth_user.id).await?;
    Ok(Json(CountResponse { count }))
}

pub async fn clear_entries(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> AppResult<Json<ClearEntriesResponse>> {
    let deleted = state.moods.delete_all_entries(auth_user.id).await?;

    tracing::info!(user_id = %auth_user.id, deleted, "Mood entries cleared");
    let _ = state.ws_tx.send(LiveEvent::EntriesCleared {
        user_id: auth_user.id,
        deleted,
    });

    Ok(Json(ClearEntriesResponse { deleted }))
}
