use serde::Deserialize;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use super::{normalize_email, ServiceError};
use crate::auth::{self, Principal};
use crate::config;
use crate::database::models::user::{Role, User, UserAssociations, UserWithProjects};
use crate::database::repositories::users::{self as repo, NewUser, UserChanges};
use crate::rbac::require_role;

fn default_timezone() -> String {
    "UTC".to_string()
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateUserRequest {
    #[validate(length(min = 2, message = "Name must be at least 2 characters"))]
    pub name: String,

    #[validate(email(message = "Invalid email address"))]
    pub email: String,

    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,

    pub role: Role,

    pub phone: Option<String>,

    #[serde(default = "default_timezone")]
    pub timezone: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateUserRequest {
    #[validate(length(min = 2, message = "Name must be at least 2 characters"))]
    pub name: String,

    #[validate(email(message = "Invalid email address"))]
    pub email: String,

    pub role: Role,

    pub phone: Option<String>,

    #[serde(default = "default_timezone")]
    pub timezone: String,
}

/// Deletion guard: nobody deletes their own account, and users still tied to
/// projects, invoices or tasks stay.
pub fn ensure_user_deletable(
    actor: Uuid,
    target: Uuid,
    associations: &UserAssociations,
) -> Result<(), ServiceError> {
    if actor == target {
        return Err(ServiceError::Invalid("Cannot delete your own account".to_string()));
    }
    if !associations.is_empty() {
        return Err(ServiceError::Invalid(
            "Cannot delete user with associated projects, invoices, or tasks".to_string(),
        ));
    }
    Ok(())
}

/// User administration. Every action is ADMIN only.
#[derive(Clone)]
pub struct UserService {
    pool: PgPool,
    bcrypt_cost: u32,
}

impl UserService {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            bcrypt_cost: config::config().security.bcrypt_cost,
        }
    }

    pub async fn list(&self, principal: &Principal) -> Result<Vec<UserWithProjects>, ServiceError> {
        require_role(principal, Role::Admin)?;
        Ok(repo::list_with_project_counts(&self.pool).await?)
    }

    pub async fn get(&self, principal: &Principal, id: Uuid) -> Result<User, ServiceError> {
        require_role(principal, Role::Admin)?;
        repo::find_by_id(&self.pool, id)
            .await?
            .ok_or_else(|| ServiceError::not_found("User"))
    }

    pub async fn create(&self, principal: &Principal, request: CreateUserRequest) -> Result<User, ServiceError> {
        require_role(principal, Role::Admin)?;
        let user = self.register(request).await?;
        info!("User {} created with role {} by {}", user.email, user.role, principal.email);
        Ok(user)
    }

    /// First ADMIN account, created from the operator CLI without a session
    pub async fn bootstrap_admin(&self, name: String, email: String, password: String) -> Result<User, ServiceError> {
        let user = self
            .register(CreateUserRequest {
                name,
                email,
                password,
                role: Role::Admin,
                phone: None,
                timezone: default_timezone(),
            })
            .await?;
        info!("Admin {} created from the command line", user.email);
        Ok(user)
    }

    async fn register(&self, mut request: CreateUserRequest) -> Result<User, ServiceError> {
        request.email = normalize_email(&request.email);
        request.validate()?;

        if repo::find_by_email(&self.pool, &request.email).await?.is_some() {
            return Err(ServiceError::Conflict("User with this email already exists".to_string()));
        }

        let password_hash = auth::hash_password(&request.password, self.bcrypt_cost)?;
        Ok(repo::insert(
            &self.pool,
            &NewUser {
                name: request.name,
                email: request.email,
                password_hash,
                role: request.role,
                phone: request.phone,
                timezone: request.timezone,
            },
        )
        .await?)
    }

    pub async fn update(
        &self,
        principal: &Principal,
        id: Uuid,
        mut request: UpdateUserRequest,
    ) -> Result<User, ServiceError> {
        require_role(principal, Role::Admin)?;
        request.email = normalize_email(&request.email);
        request.validate()?;

        if repo::email_taken_by_other(&self.pool, &request.email, id).await? {
            return Err(ServiceError::Conflict("Email is already taken by another user".to_string()));
        }

        let changes = UserChanges {
            name: request.name,
            email: request.email,
            role: request.role,
            phone: request.phone,
            timezone: request.timezone,
        };
        repo::update(&self.pool, id, &changes)
            .await?
            .ok_or_else(|| ServiceError::not_found("User"))
    }

    /// Activates an inactive user or deactivates an active one
    pub async fn toggle_status(&self, principal: &Principal, id: Uuid) -> Result<User, ServiceError> {
        require_role(principal, Role::Admin)?;
        if principal.id == id {
            return Err(ServiceError::Invalid("Cannot deactivate your own account".to_string()));
        }

        let user = repo::find_by_id(&self.pool, id)
            .await?
            .ok_or_else(|| ServiceError::not_found("User"))?;
        let updated = repo::set_active(&self.pool, id, !user.is_active).await?;

        info!(
            "User {} {} by {}",
            updated.email,
            if updated.is_active { "activated" } else { "deactivated" },
            principal.email
        );
        Ok(updated)
    }

    pub async fn delete(&self, principal: &Principal, id: Uuid) -> Result<(), ServiceError> {
        require_role(principal, Role::Admin)?;
        if principal.id == id {
            return Err(ServiceError::Invalid("Cannot delete your own account".to_string()));
        }

        let user = repo::find_by_id(&self.pool, id)
            .await?
            .ok_or_else(|| ServiceError::not_found("User"))?;
        let associations = repo::associations(&self.pool, id).await?;
        ensure_user_deletable(principal.id, user.id, &associations)?;

        repo::delete(&self.pool, id).await?;
        info!("User {} deleted by {}", user.email, principal.email);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cannot_delete_own_account() {
        let me = Uuid::new_v4();
        let err = ensure_user_deletable(me, me, &UserAssociations::default()).unwrap_err();
        assert_eq!(err.to_string(), "Cannot delete your own account");
    }

    #[test]
    fn cannot_delete_user_with_any_association() {
        let (admin, target) = (Uuid::new_v4(), Uuid::new_v4());
        let pinned = [
            UserAssociations { client_projects: 1, ..Default::default() },
            UserAssociations { managed_projects: 2, ..Default::default() },
            UserAssociations { invoices: 1, ..Default::default() },
            UserAssociations { assigned_tasks: 3, ..Default::default() },
            UserAssociations { created_tasks: 1, ..Default::default() },
        ];
        for associations in pinned {
            let err = ensure_user_deletable(admin, target, &associations).unwrap_err();
            assert_eq!(
                err.to_string(),
                "Cannot delete user with associated projects, invoices, or tasks"
            );
        }
    }

    #[test]
    fn unattached_user_can_be_deleted() {
        assert!(ensure_user_deletable(Uuid::new_v4(), Uuid::new_v4(), &UserAssociations::default()).is_ok());
    }

    #[test]
    fn create_request_defaults_timezone_and_validates() {
        let request: CreateUserRequest = serde_json::from_value(serde_json::json!({
            "name": "D",
            "email": "dev@agency.test",
            "password": "short",
            "role": "TEAM_MEMBER"
        }))
        .unwrap();
        assert_eq!(request.timezone, "UTC");

        let errors = super::super::field_errors(&request.validate().unwrap_err());
        assert_eq!(errors["name"], "Name must be at least 2 characters");
        assert_eq!(errors["password"], "Password must be at least 6 characters");
        assert!(!errors.contains_key("email"));
    }
}
