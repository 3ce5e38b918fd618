use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::task::Reference;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "invoice_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InvoiceStatus {
    #[default]
    Pending,
    Sent,
    Paid,
    Overdue,
    Cancelled,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Invoice {
    pub id: Uuid,
    pub invoice_number: String,
    pub amount: Decimal,
    pub currency: String,
    pub paid: bool,
    pub status: InvoiceStatus,
    pub notes: Option<String>,
    pub due_date: DateTime<Utc>,
    pub paid_at: Option<DateTime<Utc>>,
    pub client_id: Uuid,
    pub project_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct InvoiceRow {
    #[sqlx(flatten)]
    pub invoice: Invoice,
    pub client_name: String,
    pub project_name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct InvoiceListing {
    #[serde(flatten)]
    pub invoice: Invoice,
    pub client: Reference,
    pub project: Reference,
}

impl From<InvoiceRow> for InvoiceListing {
    fn from(row: InvoiceRow) -> Self {
        Self {
            client: Reference {
                id: row.invoice.client_id,
                name: row.client_name,
            },
            project: Reference {
                id: row.invoice.project_id,
                name: row.project_name,
            },
            invoice: row.invoice,
        }
    }
}

#[derive(Debug, Clone)]
pub struct InvoiceChanges {
    pub amount: Decimal,
    pub currency: String,
    pub paid: bool,
    pub status: InvoiceStatus,
    pub notes: Option<String>,
    pub due_date: DateTime<Utc>,
    pub paid_at: Option<DateTime<Utc>>,
    pub client_id: Uuid,
    pub project_id: Uuid,
}

/// A PAID status implies the paid flag
pub fn is_settled(paid: bool, status: InvoiceStatus) -> bool {
    paid || status == InvoiceStatus::Paid
}

/// The first settlement is stamped and kept; un-settling clears it.
pub fn next_paid_at(
    settled: bool,
    previous: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> Option<DateTime<Utc>> {
    if settled {
        Some(previous.unwrap_or(now))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn paid_status_settles_invoice() {
        assert!(is_settled(false, InvoiceStatus::Paid));
        assert!(is_settled(true, InvoiceStatus::Sent));
        assert!(!is_settled(false, InvoiceStatus::Overdue));
    }

    #[test]
    fn paid_at_is_stamped_once() {
        let first = Utc::now() - Duration::days(3);
        let now = Utc::now();
        assert_eq!(next_paid_at(true, None, now), Some(now));
        assert_eq!(next_paid_at(true, Some(first), now), Some(first));
        assert_eq!(next_paid_at(false, Some(first), now), None);
    }
}
