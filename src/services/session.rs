use chrono::{DateTime, Duration, Utc};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tracing::{info, warn};

use super::{normalize_email, ServiceError};
use crate::auth::{self, Principal};
use crate::config;
use crate::database::models::User;
use crate::database::repositories::users;

pub const INVALID_CREDENTIALS: &str = "Invalid credentials";
pub const ACCOUNT_DEACTIVATED: &str = "Account is deactivated";

#[derive(Debug, Clone, Deserialize)]
pub struct SignInRequest {
    pub email: String,
    pub password: String,
}

/// A freshly signed session
#[derive(Debug, Clone, Serialize)]
pub struct IssuedSession {
    pub user: Principal,
    pub token: String,
    pub expires_at: DateTime<Utc>,
    /// Where the signed-in user lands
    pub redirect: &'static str,
}

impl IssuedSession {
    fn for_user(user: &User) -> Result<Self, ServiceError> {
        let token = auth::issue_session(user)?;
        let max_age = config::config().security.session_max_age_hours as i64;
        Ok(Self {
            user: Principal {
                id: user.id,
                email: user.email.clone(),
                name: user.name.clone(),
                role: user.role,
                is_active: user.is_active,
            },
            token,
            expires_at: Utc::now() + Duration::hours(max_age),
            redirect: crate::rbac::dashboard_path(user.role),
        })
    }
}

/// Stand-in hash at the configured cost, checked when the email matches no account
static UNKNOWN_USER_HASH: Lazy<Option<String>> = Lazy::new(|| {
    auth::hash_password("agency-unknown-user", config::config().security.bcrypt_cost).ok()
});

/// Credentials check shared by sign-in and the operator CLI
pub fn check_credentials(user: Option<User>, password: &str) -> Result<User, ServiceError> {
    let Some(user) = user else {
        if let Some(hash) = UNKNOWN_USER_HASH.as_deref() {
            auth::verify_password(password, hash);
        }
        return Err(ServiceError::Unauthenticated(INVALID_CREDENTIALS.to_string()));
    };
    if !auth::verify_password(password, &user.password_hash) {
        return Err(ServiceError::Unauthenticated(INVALID_CREDENTIALS.to_string()));
    }
    if !user.is_active {
        return Err(ServiceError::Unauthenticated(ACCOUNT_DEACTIVATED.to_string()));
    }
    Ok(user)
}

#[derive(Clone)]
pub struct SessionService {
    pool: PgPool,
}

impl SessionService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn sign_in(&self, request: SignInRequest) -> Result<IssuedSession, ServiceError> {
        let email = normalize_email(&request.email);
        let found = users::find_by_email(&self.pool, &email).await?;

        let user = match check_credentials(found, &request.password) {
            Ok(user) => user,
            Err(e) => {
                warn!("Sign-in refused for {}: {}", email, e);
                return Err(e);
            }
        };

        users::touch_last_login(&self.pool, user.id).await?;
        let session = IssuedSession::for_user(&user)?;
        info!("{} signed in as {}", user.email, user.role);
        Ok(session)
    }

    /// Re-reads the account so role and status changes reach the token
    pub async fn refresh(&self, principal: &Principal) -> Result<IssuedSession, ServiceError> {
        let user = users::find_by_id(&self.pool, principal.id)
            .await?
            .ok_or_else(|| ServiceError::Unauthenticated("Session user no longer exists".to_string()))?;
        IssuedSession::for_user(&user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::Role;
    use uuid::Uuid;

    fn user(password: &str, is_active: bool) -> User {
        let now = Utc::now();
        User {
            id: Uuid::new_v4(),
            name: "Client One".into(),
            email: "client@agency.test".into(),
            password_hash: auth::hash_password(password, 4).unwrap(),
            role: Role::Client,
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
    fn unknown_email_and_wrong_password_look_the_same() {
        let unknown = check_credentials(None, "secret1").unwrap_err();
        let wrong = check_credentials(Some(user("secret1", true)), "secret2").unwrap_err();
        assert_eq!(unknown.to_string(), INVALID_CREDENTIALS);
        assert_eq!(wrong.to_string(), INVALID_CREDENTIALS);
    }

    #[test]
    fn unknown_email_still_runs_a_hash_check() {
        let hash = UNKNOWN_USER_HASH.as_deref().expect("fallback hash is built");
        assert!(hash.starts_with("$2"));
        assert!(!auth::verify_password("secret1", hash));

        let err = check_credentials(None, "agency-unknown-user").unwrap_err();
        assert_eq!(err.to_string(), INVALID_CREDENTIALS);
    }

    #[test]
    fn deactivated_account_is_refused_after_password_check() {
        let err = check_credentials(Some(user("secret1", false)), "secret1").unwrap_err();
        assert_eq!(err.to_string(), ACCOUNT_DEACTIVATED);

        // A wrong password never reveals the account state
        let err = check_credentials(Some(user("secret1", false)), "nope").unwrap_err();
        assert_eq!(err.to_string(), INVALID_CREDENTIALS);
    }

    #[test]
    fn valid_credentials_pass() {
        let signed = check_credentials(Some(user("secret1", true)), "secret1").unwrap();
        assert_eq!(signed.role, Role::Client);
    }

    #[test]
    fn issued_session_points_at_role_home() {
        let session = IssuedSession::for_user(&user("secret1", true)).unwrap();
        assert_eq!(session.redirect, "/dashboard/client");
        assert!(session.expires_at > Utc::now());
        assert!(!session.token.is_empty());
    }
}
