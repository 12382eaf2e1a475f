use axum::{
    extract::{Query, State},
    http::header,
    response::{IntoResponse, Response},
    Extension,
};
use chrono::Utc;

use crate::auth::middleware::AuthUser;
use crate::dto::ExportQuery;
use crate::error::AppResult;
use crate::handlers::analytics::resolve_timezone;
use crate::services::export::{entries_to_csv, export_filename};
use crate::AppState;

/// Streams every entry as a CSV attachment, newest first.
pub async fn export_csv(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Query(query): Query<ExportQuery>,
) -> AppResult<Response> {
    let tz = resolve_timezone(&state.config, query.tz.as_deref())?;
    let entries = state.moods.fetch_entries(auth_user.id).await?;
    let csv = entries_to_csv(&entries, &tz);

    tracing::info!(user_id = %auth_user.id, rows = entries.len(), "Exported mood entries");
    let filename = export_filename(Utc::now().with_timezone(&tz).date_naive());
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        csv,
    )
        .into_response())
}
