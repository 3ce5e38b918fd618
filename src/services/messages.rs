use chrono::Utc;
use serde::Deserialize;
use sqlx::PgPool;
use tracing::{debug, info};
use uuid::Uuid;
use validator::Validate;

use super::ServiceError;
use crate::auth::Principal;
use crate::database::models::message::{build_threads, Message, MessagePriority, MessageThread, NewMessage};
use crate::database::models::Role;
use crate::database::repositories::messages as repo;
use crate::rbac::require_any_role;

pub const MAX_CONTENT_CHARS: usize = 5000;

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateMessageRequest {
    #[validate(length(min = 1, max = 5000, message = "Message must be between 1 and 5000 characters"))]
    pub content: String,

    pub recipient_id: Option<Uuid>,
    pub project_id: Option<Uuid>,

    #[serde(default)]
    pub priority: MessagePriority,

    pub parent_id: Option<Uuid>,
}

/// Builds the row for a new message. For a reply, `parent` is the message
/// being answered and must already be known to be visible to the author.
pub fn compose(author: &Principal, request: CreateMessageRequest, parent: Option<&Message>) -> NewMessage {
    let (recipient_id, project_id) = match parent {
        Some(parent) => (
            request.recipient_id.or_else(|| parent.reply_recipient(author.id)),
            request.project_id.or(parent.project_id),
        ),
        None => (request.recipient_id, request.project_id),
    };

    NewMessage {
        content: request.content,
        sender_id: author.id,
        recipient_id,
        project_id,
        priority: request.priority,
        from_admin: matches!(author.role, Role::Admin | Role::ProjectManager),
        parent_id: parent.map(|p| p.id),
    }
}

#[derive(Clone)]
pub struct MessageService {
    pool: PgPool,
}

impl MessageService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(
        &self,
        principal: &Principal,
        mut request: CreateMessageRequest,
    ) -> Result<Message, ServiceError> {
        require_any_role(principal, &Role::ALL)?;
        request.content = request.content.trim().to_string();
        request.validate()?;

        let parent = match request.parent_id {
            Some(parent_id) => {
                let parent = repo::find_by_id(&self.pool, parent_id)
                    .await?
                    .ok_or_else(|| ServiceError::not_found("Parent message"))?;
                if !parent.is_visible_to(principal.id, principal.role) {
                    return Err(ServiceError::Unauthorized);
                }
                Some(parent)
            }
            None => None,
        };

        let message = repo::insert(&self.pool, &compose(principal, request, parent.as_ref())).await?;
        info!(
            "Message {} sent by {}{}",
            message.id,
            principal.email,
            if message.parent_id.is_some() { " (reply)" } else { "" }
        );
        Ok(message)
    }

    /// Threads visible to the caller, nested and ordered for display
    pub async fn list(&self, principal: &Principal) -> Result<Vec<MessageThread>, ServiceError> {
        require_any_role(principal, &Role::ALL)?;
        let rows = repo::thread_rows(&self.pool, principal.id, principal.role == Role::Admin).await?;
        debug!("Loaded {} messages for {}", rows.len(), principal.email);
        Ok(build_threads(rows))
    }

    /// Idempotent: an already-read message is returned unchanged
    pub async fn mark_read(&self, principal: &Principal, id: Uuid) -> Result<Message, ServiceError> {
        require_any_role(principal, &Role::ALL)?;
        let message = repo::find_by_id(&self.pool, id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Message"))?;
        if !message.can_mark_read(principal.id, principal.role) {
            return Err(ServiceError::Unauthorized);
        }

        // The write itself preserves an existing read_at, so racing callers agree
        match message.mark_read_change(Utc::now()) {
            Some(now) => Ok(repo::mark_read(&self.pool, id, now).await?),
            None => Ok(message),
        }
    }

    /// Replies are removed along with the message
    pub async fn delete(&self, principal: &Principal, id: Uuid) -> Result<(), ServiceError> {
        require_any_role(principal, &Role::ALL)?;
        let message = repo::find_by_id(&self.pool, id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Message"))?;
        if !message.can_delete(principal.id, principal.role) {
            return Err(ServiceError::Unauthorized);
        }

        repo::delete(&self.pool, id).await?;
        info!("Message {} deleted by {}", id, principal.email);
        Ok(())
    }
}
