use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::collections::HashMap;
use uuid::Uuid;

use super::user::Role;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "message_priority", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MessagePriority {
    Low,
    #[default]
    Normal,
    High,
    Urgent,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Message {
    pub id: Uuid,
    pub content: String,
    pub sender_id: Uuid,
    pub recipient_id: Option<Uuid>,
    pub project_id: Option<Uuid>,
    pub priority: MessagePriority,
    pub from_admin: bool,
    pub read: bool,
    pub read_at: Option<DateTime<Utc>>,
    pub parent_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl Message {
    pub fn is_visible_to(&self, user_id: Uuid, role: Role) -> bool {
        role == Role::Admin || self.sender_id == user_id || self.recipient_id == Some(user_id)
    }

    pub fn can_mark_read(&self, user_id: Uuid, role: Role) -> bool {
        role == Role::Admin || self.recipient_id == Some(user_id)
    }

    pub fn can_delete(&self, user_id: Uuid, role: Role) -> bool {
        role == Role::Admin || self.sender_id == user_id
    }

    /// Read state after a mark-read, or `None` when the message is already read.
    pub fn mark_read_change(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        if self.read {
            None
        } else {
            Some(self.read_at.unwrap_or(now))
        }
    }

    /// Who a reply to this message goes to when the author names nobody
    pub fn reply_recipient(&self, author: Uuid) -> Option<Uuid> {
        if author == self.sender_id {
            self.recipient_id
        } else {
            Some(self.sender_id)
        }
    }
}

/// Message joined with display names
#[derive(Debug, Clone, FromRow)]
pub struct MessageRow {
    #[sqlx(flatten)]
    pub message: Message,
    pub sender_name: String,
    pub recipient_name: Option<String>,
    pub project_name: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewMessage {
    pub content: String,
    pub sender_id: Uuid,
    pub recipient_id: Option<Uuid>,
    pub project_id: Option<Uuid>,
    pub priority: MessagePriority,
    pub from_admin: bool,
    pub parent_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MessageThread {
    #[serde(flatten)]
    pub message: Message,
    pub sender_name: String,
    pub recipient_name: Option<String>,
    pub project_name: Option<String>,
    /// All descendants, not just direct replies
    pub reply_count: usize,
    /// Unread messages in this node and its descendants
    pub unread_count: usize,
    pub replies: Vec<MessageThread>,
}

/// Nest a flat set of messages into reply trees.
///
/// Roots are messages without a parent in the set, newest first. Replies are
/// ordered oldest first at every level. Every input row appears exactly once.
pub fn build_threads(rows: Vec<MessageRow>) -> Vec<MessageThread> {
    let ids: std::collections::HashSet<Uuid> = rows.iter().map(|r| r.message.id).collect();
    let mut children: HashMap<Uuid, Vec<MessageRow>> = HashMap::new();
    let mut roots = Vec::new();

    for row in rows {
        match row.message.parent_id {
            Some(parent) if ids.contains(&parent) => children.entry(parent).or_default().push(row),
            _ => roots.push(row),
        }
    }

    let mut threads: Vec<MessageThread> = roots
        .into_iter()
        .map(|row| attach_replies(row, &mut children))
        .collect();

    // Rows left over can only come from a parent cycle; surface them as roots.
    let leftovers: Vec<MessageRow> = children.into_values().flatten().collect();
    let mut stranded: HashMap<Uuid, Vec<MessageRow>> = HashMap::new();
    threads.extend(leftovers.into_iter().map(|row| attach_replies(row, &mut stranded)));

    threads.sort_by(|a, b| b.message.created_at.cmp(&a.message.created_at));
    threads
}

fn attach_replies(row: MessageRow, children: &mut HashMap<Uuid, Vec<MessageRow>>) -> MessageThread {
    let mut direct = children.remove(&row.message.id).unwrap_or_default();
    direct.sort_by(|a, b| a.message.created_at.cmp(&b.message.created_at));

    let replies: Vec<MessageThread> = direct
        .into_iter()
        .map(|child| attach_replies(child, children))
        .collect();

    let reply_count = replies.iter().map(|r| 1 + r.reply_count).sum();
    let unread_count =
        usize::from(!row.message.read) + replies.iter().map(|r| r.unread_count).sum::<usize>();

    MessageThread {
        message: row.message,
        sender_name: row.sender_name,
        recipient_name: row.recipient_name,
        project_name: row.project_name,
        reply_count,
        unread_count,
        replies,
    }
}
