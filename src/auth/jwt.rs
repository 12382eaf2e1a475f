use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, TokenData, Validation};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::config::Config;
use crate::error::{AppError, AppResult};

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: Uuid,
    pub email: String,
    pub exp: i64,
    pub iat: i64,
    pub token_type: TokenType,
    /// Set on refresh tokens so two issued in the same second still differ.
    #[serde(default)]
    pub jti: Option<Uuid>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: i64,
}

fn sign(user_id: Uuid, email: &str, token_type: TokenType, config: &Config) -> AppResult<String> {
    let now = Utc::now();
    let (ttl, jti) = match token_type {
        TokenType::Access => (config.jwt_access_ttl_secs, None),
        TokenType::Refresh => (config.jwt_refresh_ttl_secs, Some(Uuid::new_v4())),
    };
    let claims = Claims {
        sub: user_id,
        email: email.to_string(),
        exp: (now + Duration::seconds(ttl)).timestamp(),
        iat: now.timestamp(),
        token_type,
        jti,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to create {:?} token: {}", token_type, e)))
}

pub fn create_token_pair(user_id: Uuid, email: &str, config: &Config) -> AppResult<TokenPair> {
    Ok(TokenPair {
        access_token: sign(user_id, email, TokenType::Access, config)?,
        refresh_token: sign(user_id, email, TokenType::Refresh, config)?,
        expires_in: config.jwt_access_ttl_secs,
    })
}

/// Compute SHA-256 hash of a raw token string, returned as lowercase hex.
pub fn hash_token(raw_token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(raw_token.as_bytes());
    format!("{:x}", hasher.finalize())
}

pub fn verify_token(token: &str, config: &Config) -> AppResult<TokenData<Claims>> {
    let mut validation = Validation::default();
    validation.validate_exp = true;

    decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.jwt_secret.as_bytes()),
        &validation,
    )
    .map_err(|_| AppError::Unauthorized)
}

/// Verifies `token` and checks it is of the expected kind.
pub fn verify_token_of_type(
    token: &str,
    expected: TokenType,
    config: &Config,
) -> AppResult<Claims> {
    let data = verify_token(token, config)?;
    if data.claims.token_type != expected {
        return Err(AppError::Unauthorized);
    }
    Ok(data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pair_round_trip() {
        let config = Config::for_tests();
        let user = Uuid::new_v4();
        let pair = create_token_pair(user, "a@example.com", &config).unwrap();

        let access = verify_token_of_type(&pair.access_token, TokenType::Access, &config).unwrap();
        assert_eq!(access.sub, user);
        assert_eq!(access.jti, None);

        let refresh =
            verify_token_of_type(&pair.refresh_token, TokenType::Refresh, &config).unwrap();
        assert!(refresh.jti.is_some());
        assert_eq!(pair.expires_in, 900);
    }

    #[test]
    fn test_wrong_type_rejected() {
        let config = Config::for_tests();
        let pair = create_token_pair(Uuid::new_v4(), "a@example.com", &config).unwrap();
        assert!(verify_token_of_type(&pair.refresh_token, TokenType::Access, &config).is_err());
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let config = Config::for_tests();
        let token = create_token_pair(Uuid::new_v4(), "a@example.com", &config)
            .unwrap()
            .access_token;
        let other = Config {
            jwt_secret: "another-secret".into(),
            ..Config::for_tests()
        };
        assert!(verify_token(&token, &other).is_err());
    }

    #[test]
    fn test_expired_token_rejected() {
        let config = Config {
            jwt_access_ttl_secs: -3600,
            ..Config::for_tests()
        };
        let token = create_token_pair(Uuid::new_v4(), "a@example.com", &config)
            .unwrap()
            .access_token;
        assert!(verify_token(&token, &config).is_err());
    }

    #[test]
    fn test_hash_token_deterministic() {
        let h1 = hash_token("test-refresh-token-value");
        assert_eq!(h1, hash_token("test-refresh-token-value"));
        assert_eq!(h1.len(), 64);
        assert_ne!(h1, hash_token("token-b"));
    }
}
