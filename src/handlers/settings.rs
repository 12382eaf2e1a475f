use axum::{
    extract::{Path, State},
    Extension, Json,
};
use serde_json::{Map, Value};

use crate::auth::middleware::AuthUser;
use crate::error::{AppError, AppResult};
use crate::models::settings::{SettingKey, UpdateSettingRequest};
use crate::AppState;

fn parse_key(raw: &str) -> AppResult<SettingKey> {
    raw.parse().map_err(AppError::NotFound)
}

async fn read_setting(state: &AppState, owner: uuid::Uuid, key: SettingKey) -> AppResult<Value> {
    Ok(state
        .settings
        .get_setting(owner, key)
        .await?
        .unwrap_or_else(|| key.default_value()))
}

/// Every known setting, defaults filled in.
pub async fn get_settings(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> AppResult<Json<Map<String, Value>>> {
    let mut settings = Map::new();
    for key in SettingKey::ALL {
        settings.insert(
            key.as_str().to_string(),
            read_setting(&state, auth_user.id, key).await?,
        );
    }
    Ok(Json(settings))
}

pub async fn get_setting(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(key): Path<String>,
) -> AppResult<Json<Value>> {
    let key = parse_key(&key)?;
    let value = read_setting(&state, auth_user.id, key).await?;
    Ok(Json(serde_json::json!({ "key": key, "value": value })))
}

pub async fn put_setting(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(key): Path<String>,
    Json(body): Json<UpdateSettingRequest>,
) -> AppResult<Json<Value>> {
    let key = parse_key(&key)?;
    key.validate(&body.value).map_err(AppError::Validation)?;

    state
        .settings
        .set_setting(auth_user.id, key, body.value.clone())
        .await?;

    tracing::debug!(user_id = %auth_user.id, key = %key, "Setting updated");
    Ok(Json(serde_json::json!({ "key": key, "value": body.value })))
}
