use axum::{extract::State, Extension, Json};
use chrono::{Duration, Utc};
use uuid::Uuid;
use validator::Validate;

use crate::auth::{
    jwt::{create_token_pair, hash_token, verify_token_of_type, TokenPair, TokenType},
    middleware::AuthUser,
    password::{hash_password, verify_password},
};
use crate::db::StoreError;
use crate::dto::{LoginRequest, MessageResponse, RefreshRequest, RegisterRequest};
use crate::error::{AppError, AppResult};
use crate::models::user::{NewUser, UserProfile};
use crate::AppState;

/// Create a token pair and persist the refresh token hash.
async fn issue_token_pair(
    state: &AppState,
    user_id: Uuid,
    email: &str,
    parent_token_id: Option<Uuid>,
) -> AppResult<TokenPair> {
    let tokens = create_token_pair(user_id, email, &state.config)?;
    let expires_at = Utc::now() + Duration::seconds(state.config.jwt_refresh_ttl_secs);
    state
        .users
        .store_refresh_token(
            user_id,
            &hash_token(&tokens.refresh_token),
            expires_at,
            parent_token_id,
        )
        .await?;
    Ok(tokens)
}

pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterRequest>,
) -> AppResult<Json<TokenPair>> {
    body.validate()?;
    let email = body.email.trim().to_lowercase();

    if state.users.find_user_by_email(&email).await?.is_some() {
        return Err(AppError::Conflict("Email already registered".into()));
    }

    let password_hash = hash_password(&body.password)?;
    let user = state
        .users
        .create_user(NewUser {
            email: email.clone(),
            password_hash,
        })
        .await
        .map_err(|e| match e {
            StoreError::Conflict(_) => AppError::Conflict("Email already registered".into()),
            other => other.into(),
        })?;

    tracing::info!(user_id = %user.id, "User registered");
    let tokens = issue_token_pair(&state, user.id, &user.email, None).await?;
    Ok(Json(tokens))
}

pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> AppResult<Json<TokenPair>> {
    body.validate()?;
    let email = body.email.trim().to_lowercase();

    let user = state
        .users
        .find_user_by_email(&email)
        .await?
        .ok_or(AppError::Unauthorized)?;

    if !verify_password(&body.password, &user.password_hash)? {
        return Err(AppError::Unauthorized);
    }

    let tokens = issue_token_pair(&state, user.id, &user.email, None).await?;
    Ok(Json(tokens))
}

pub async fn refresh(
    State(state): State<AppState>,
    Json(body): Json<RefreshRequest>,
) -> AppResult<Json<TokenPair>> {
    let claims = verify_token_of_type(&body.refresh_token, TokenType::Refresh, &state.config)?;

    let stored = state
        .users
        .find_refresh_token(&hash_token(&body.refresh_token))
        .await?
        .ok_or(AppError::Unauthorized)?;

    // A revoked token coming back means it leaked: revoke the whole family.
    if stored.revoked {
        tracing::warn!(
            user_id = %stored.user_id,
            token_id = %stored.id,
            "Refresh token reuse detected, revoking all tokens for user"
        );
        state.users.revoke_all_refresh_tokens(stored.user_id).await?;
        return Err(AppError::Unauthorized);
    }

    if stored.user_id != claims.sub || stored.expires_at <= Utc::now() {
        return Err(AppError::Unauthorized);
    }

    state.users.revoke_refresh_token(stored.id).await?;

    let tokens = issue_token_pair(&state, claims.sub, &claims.email, Some(stored.id)).await?;
    Ok(Json(tokens))
}

pub async fn logout(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> AppResult<Json<MessageResponse>> {
    state.users.revoke_all_refresh_tokens(auth_user.id).await?;
    Ok(Json(MessageResponse {
        message: "Logged out successfully".into(),
    }))
}

pub async fn me(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> AppResult<Json<UserProfile>> {
    let user = state
        .users
        .find_user_by_id(auth_user.id)
        .await?
        .ok_or(AppError::NotFound("User not found".into()))?;
    let total_entries = state.moods.count_entries(auth_user.id).await?;

    Ok(Json(UserProfile::new(user, total_entries)))
}
