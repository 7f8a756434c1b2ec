use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::config;
use crate::types::Role;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub email: String,
    pub roles: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub daycare_id: Option<Uuid>,
    pub exp: i64,
    pub iat: i64,
}

impl Claims {
    pub fn new(user_id: Uuid, email: String, roles: &[Role], daycare_id: Option<Uuid>) -> Self {
        Self::with_expiry(
            user_id,
            email,
            roles,
            daycare_id,
            config::config().security.jwt_expiry_hours as i64,
        )
    }

    pub fn with_expiry(
        user_id: Uuid,
        email: String,
        roles: &[Role],
        daycare_id: Option<Uuid>,
        expiry_hours: i64,
    ) -> Self {
        let now = Utc::now();
        Self {
            sub: user_id,
            email,
            roles: roles.iter().map(|r| r.as_str().to_string()).collect(),
            daycare_id,
            exp: (now + Duration::hours(expiry_hours)).timestamp(),
            iat: now.timestamp(),
        }
    }

    /// Same identity with a fresh issue and expiry time
    pub fn renewed(&self) -> Self {
        let now = Utc::now();
        let expiry_hours = config::config().security.jwt_expiry_hours as i64;
        Self {
            exp: (now + Duration::hours(expiry_hours)).timestamp(),
            iat: now.timestamp(),
            ..self.clone()
        }
    }
}

#[derive(Debug, Error)]
pub enum JwtError {
    #[error("JWT generation error: {0}")]
    TokenGeneration(String),

    #[error("Invalid JWT token: {0}")]
    InvalidToken(String),

    #[error("Invalid JWT secret")]
    InvalidSecret,
}

/// Sign claims with the configured secret
pub fn generate_jwt(claims: &Claims) -> Result<String, JwtError> {
    generate_jwt_with_secret(claims, &config::config().security.jwt_secret)
}

pub fn generate_jwt_with_secret(claims: &Claims, secret: &str) -> Result<String, JwtError> {
    if secret.is_empty() {
        return Err(JwtError::InvalidSecret);
    }

    let encoding_key = EncodingKey::from_secret(secret.as_bytes());
    encode(&Header::default(), claims, &encoding_key)
        .map_err(|e| JwtError::TokenGeneration(e.to_string()))
}

/// Verify signature and expiry against the configured secret
pub fn validate_jwt(token: &str) -> Result<Claims, JwtError> {
    validate_jwt_with_secret(token, &config::config().security.jwt_secret)
}

pub fn validate_jwt_with_secret(token: &str, secret: &str) -> Result<Claims, JwtError> {
    if secret.is_empty() {
        return Err(JwtError::InvalidSecret);
    }

    let decoding_key = DecodingKey::from_secret(secret.as_bytes());
    let token_data = decode::<Claims>(token, &decoding_key, &Validation::default())
        .map_err(|e| JwtError::InvalidToken(e.to_string()))?;

    Ok(token_data.claims)
}

/// The authorization rule: any claimed role equal to any allowed role.
pub fn has_any_role(claimed: &[String], allowed: &[Role]) -> bool {
    claimed
        .iter()
        .any(|c| allowed.iter().any(|a| a.as_str() == c.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "unit-test-secret";

    #[test]
    fn token_round_trips() {
        let daycare = Uuid::new_v4();
        let claims = Claims::with_expiry(
            Uuid::new_v4(),
            "manager@example.com".to_string(),
            &[Role::OfficeManager],
            Some(daycare),
            1,
        );
        let token = generate_jwt_with_secret(&claims, SECRET).unwrap();
        let decoded = validate_jwt_with_secret(&token, SECRET).unwrap();
        assert_eq!(decoded, claims);
        assert_eq!(decoded.roles, vec!["office_manager".to_string()]);
    }

    #[test]
    fn rejects_wrong_secret() {
        let claims = Claims::with_expiry(Uuid::new_v4(), "a@b.c".into(), &[Role::Admin], None, 1);
        let token = generate_jwt_with_secret(&claims, SECRET).unwrap();
        assert!(matches!(
            validate_jwt_with_secret(&token, "other-secret"),
            Err(JwtError::InvalidToken(_))
        ));
    }

    #[test]
    fn rejects_expired_token() {
        let claims = Claims::with_expiry(Uuid::new_v4(), "a@b.c".into(), &[Role::Admin], None, -2);
        let token = generate_jwt_with_secret(&claims, SECRET).unwrap();
        assert!(validate_jwt_with_secret(&token, SECRET).is_err());
    }

    #[test]
    fn empty_secret_is_refused() {
        let claims = Claims::with_expiry(Uuid::new_v4(), "a@b.c".into(), &[Role::Admin], None, 1);
        assert!(matches!(generate_jwt_with_secret(&claims, ""), Err(JwtError::InvalidSecret)));
    }

    #[test]
    fn role_intersection() {
        let claimed = vec!["responsible".to_string(), "office_manager".to_string()];
        assert!(has_any_role(&claimed, &[Role::Admin, Role::OfficeManager]));
        assert!(!has_any_role(&claimed, &[Role::Admin]));
        assert!(!has_any_role(&[], &[Role::Admin]));
        assert!(!has_any_role(&claimed, &[]));
    }
}
