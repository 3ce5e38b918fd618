use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config;
use crate::database::models::{Role, User};

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("JWT secret is not configured")]
    InvalidSecret,

    #[error("Invalid session token: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),

    #[error("Password hashing failed: {0}")]
    Hash(#[from] bcrypt::BcryptError),
}

/// Signed into every session token. Role and active flag are snapshotted at
/// sign-in; `refresh` re-reads them from the database.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    pub sub: Uuid,
    pub email: String,
    pub name: String,
    pub role: Role,
    pub is_active: bool,
    pub exp: i64,
    pub iat: i64,
}

impl SessionClaims {
    pub fn for_user(user: &User, max_age_hours: u64) -> Self {
        let now = Utc::now();
        let exp = (now + Duration::hours(max_age_hours as i64)).timestamp();

        Self {
            sub: user.id,
            email: user.email.clone(),
            name: user.name.clone(),
            role: user.role,
            is_active: user.is_active,
            exp,
            iat: now.timestamp(),
        }
    }
}

/// The signed-in caller, as seen by guards, handlers and services
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Principal {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub role: Role,
    pub is_active: bool,
}

impl From<SessionClaims> for Principal {
    fn from(claims: SessionClaims) -> Self {
        Self {
            id: claims.sub,
            email: claims.email,
            name: claims.name,
            role: claims.role,
            is_active: claims.is_active,
        }
    }
}

pub fn encode_token(claims: &SessionClaims, secret: &str) -> Result<String, AuthError> {
    if secret.is_empty() {
        return Err(AuthError::InvalidSecret);
    }
    let key = EncodingKey::from_secret(secret.as_bytes());
    Ok(encode(&Header::default(), claims, &key)?)
}

pub fn decode_token(token: &str, secret: &str) -> Result<SessionClaims, AuthError> {
    if secret.is_empty() {
        return Err(AuthError::InvalidSecret);
    }
    let key = DecodingKey::from_secret(secret.as_bytes());
    let data = decode::<SessionClaims>(token, &key, &Validation::default())?;
    Ok(data.claims)
}

/// Sign a session for `user` with the configured secret and max age
pub fn issue_session(user: &User) -> Result<String, AuthError> {
    let security = &config::config().security;
    let claims = SessionClaims::for_user(user, security.session_max_age_hours);
    encode_token(&claims, &security.jwt_secret)
}

pub fn verify_session(token: &str) -> Result<Principal, AuthError> {
    decode_token(token, &config::config().security.jwt_secret).map(Principal::from)
}

pub fn hash_password(password: &str, cost: u32) -> Result<String, AuthError> {
    Ok(bcrypt::hash(password, cost)?)
}

/// A malformed stored hash counts as a mismatch
pub fn verify_password(password: &str, hash: &str) -> bool {
    bcrypt::verify(password, hash).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(role: Role, is_active: bool) -> User {
        let now = Utc::now();
        User {
            id: Uuid::new_v4(),
            name: "Pat Manager".into(),
            email: "pm@agency.test".into(),
            password_hash: String::new(),
            role,
            is_active,
            phone: None,
            timezone: "UTC".into(),
            avatar: None,
            last_login_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn token_round_trip_keeps_role_and_status() {
        let user = user(Role::ProjectManager, false);
        let token = encode_token(&SessionClaims::for_user(&user, 24), "secret").unwrap();
        let principal = Principal::from(decode_token(&token, "secret").unwrap());

        assert_eq!(principal.id, user.id);
        assert_eq!(principal.role, Role::ProjectManager);
        assert!(!principal.is_active);
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = encode_token(&SessionClaims::for_user(&user(Role::Admin, true), 24), "one").unwrap();
        assert!(matches!(decode_token(&token, "two"), Err(AuthError::Token(_))));
    }

    #[test]
    fn expired_token_is_rejected() {
        let mut claims = SessionClaims::for_user(&user(Role::Client, true), 24);
        claims.exp = (Utc::now() - Duration::hours(2)).timestamp();
        let token = encode_token(&claims, "secret").unwrap();
        assert!(decode_token(&token, "secret").is_err());
    }

    #[test]
    fn empty_secret_never_signs() {
        let claims = SessionClaims::for_user(&user(Role::Client, true), 24);
        assert!(matches!(encode_token(&claims, ""), Err(AuthError::InvalidSecret)));
        assert!(matches!(decode_token("abc", ""), Err(AuthError::InvalidSecret)));
    }

    #[test]
    fn password_hash_verifies() {
        let hash = hash_password("hunter22", 4).unwrap();
        assert!(verify_password("hunter22", &hash));
        assert!(!verify_password("hunter23", &hash));
        assert!(!verify_password("hunter22", "not-a-hash"));
    }
}
