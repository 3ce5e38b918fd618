//! Server actions. Every action takes the calling `Principal` and checks its
//! role again before touching the database.

pub mod invoices;
pub mod messages;
pub mod projects;
pub mod session;
pub mod tasks;
pub mod teams;
pub mod users;

use std::collections::HashMap;
use validator::{Validate, ValidationErrors};

use crate::auth::AuthError;
use crate::database::manager::DatabaseError;
use crate::rbac::AccessDenied;

pub use invoices::InvoiceService;
pub use messages::MessageService;
pub use projects::ProjectService;
pub use session::SessionService;
pub use tasks::TaskService;
pub use teams::TeamService;
pub use users::UserService;

/// Field name -> first failure message
pub type FieldErrors = HashMap<String, String>;

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Unauthorized")]
    Unauthorized,

    /// Sign-in refused; the message is shown to the user
    #[error("{0}")]
    Unauthenticated(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    /// A business rule refused the action
    #[error("{0}")]
    Invalid(String),

    #[error("Validation failed")]
    Validation(FieldErrors),

    #[error(transparent)]
    Database(DatabaseError),

    #[error(transparent)]
    Auth(#[from] AuthError),
}

impl ServiceError {
    pub fn not_found(what: &str) -> Self {
        ServiceError::NotFound(format!("{what} not found"))
    }
}

impl From<DatabaseError> for ServiceError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::NotFound(msg) => ServiceError::NotFound(msg),
            other => ServiceError::Database(other),
        }
    }
}

impl From<sqlx::Error> for ServiceError {
    fn from(err: sqlx::Error) -> Self {
        DatabaseError::from(err).into()
    }
}

impl From<AccessDenied> for ServiceError {
    fn from(_: AccessDenied) -> Self {
        ServiceError::Unauthorized
    }
}

impl From<ValidationErrors> for ServiceError {
    fn from(errors: ValidationErrors) -> Self {
        ServiceError::Validation(field_errors(&errors))
    }
}

pub fn field_errors(errors: &ValidationErrors) -> FieldErrors {
    errors
        .field_errors()
        .into_iter()
        .filter_map(|(field, failures)| {
            let failure = failures.first()?;
            let message = failure
                .message
                .as_ref()
                .map(|m| m.to_string())
                .unwrap_or_else(|| format!("Invalid {field}"));
            Some((field.to_string(), message))
        })
        .collect()
}

/// Runs derive-based validation, then lets `extra` add rules the derive
/// cannot express. Fails with every collected field error.
pub fn validate_with<T: Validate>(input: &T, extra: impl FnOnce(&mut FieldErrors)) -> Result<(), ServiceError> {
    let mut errors = match input.validate() {
        Ok(()) => FieldErrors::new(),
        Err(e) => field_errors(&e),
    };
    extra(&mut errors);
    if errors.is_empty() {
        Ok(())
    } else {
        Err(ServiceError::Validation(errors))
    }
}

/// Emails are compared and stored trimmed and lower-cased
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
