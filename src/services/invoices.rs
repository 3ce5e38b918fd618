use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use super::{validate_with, ServiceError};
use crate::auth::Principal;
use crate::database::models::invoice::{
    is_settled, next_paid_at, Invoice, InvoiceChanges, InvoiceListing, InvoiceStatus,
};
use crate::database::models::Role;
use crate::database::repositories::invoices as repo;
use crate::rbac::require_role;

fn default_currency() -> String {
    "USD".to_string()
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct InvoiceRequest {
    pub amount: Decimal,

    #[serde(default = "default_currency")]
    #[validate(length(equal = 3, message = "Currency must be a 3 letter code"))]
    pub currency: String,

    #[serde(default)]
    pub paid: bool,

    #[serde(default)]
    pub status: InvoiceStatus,

    pub notes: Option<String>,
    pub due_date: DateTime<Utc>,
    pub client_id: Uuid,
    pub project_id: Uuid,
}

impl InvoiceRequest {
    /// `previous_paid_at` is the stored stamp when updating
    fn into_changes(
        mut self,
        previous_paid_at: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> Result<InvoiceChanges, ServiceError> {
        self.currency = self.currency.trim().to_ascii_uppercase();
        validate_with(&self, |errors| {
            if self.amount <= Decimal::ZERO {
                errors.insert("amount".into(), "Amount must be greater than 0".into());
            }
            if !self.currency.chars().all(|c| c.is_ascii_alphabetic()) {
                errors.insert("currency".into(), "Currency must be a 3 letter code".into());
            }
        })?;

        let settled = is_settled(self.paid, self.status);
        Ok(InvoiceChanges {
            amount: self.amount,
            currency: self.currency,
            paid: settled,
            status: self.status,
            notes: self.notes,
            due_date: self.due_date,
            paid_at: next_paid_at(settled, previous_paid_at, now),
            client_id: self.client_id,
            project_id: self.project_id,
        })
    }
}

#[derive(Clone)]
pub struct InvoiceService {
    pool: PgPool,
}

impl InvoiceService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Admins see every invoice, clients their own
    pub async fn list(&self, principal: &Principal) -> Result<Vec<InvoiceListing>, ServiceError> {
        let client_id = match principal.role {
            Role::Admin if principal.is_active => None,
            Role::Client if principal.is_active => Some(principal.id),
            _ => return Err(ServiceError::Unauthorized),
        };
        let rows = repo::list(&self.pool, client_id).await?;
        Ok(rows.into_iter().map(InvoiceListing::from).collect())
    }

    pub async fn create(&self, principal: &Principal, request: InvoiceRequest) -> Result<Invoice, ServiceError> {
        require_role(principal, Role::Admin)?;
        let changes = request.into_changes(None, Utc::now())?;
        let invoice = repo::insert(&self.pool, &changes).await?;
        info!("Invoice {} created by {}", invoice.invoice_number, principal.email);
        Ok(invoice)
    }

    pub async fn update(
        &self,
        principal: &Principal,
        id: Uuid,
        request: InvoiceRequest,
    ) -> Result<Invoice, ServiceError> {
        require_role(principal, Role::Admin)?;
        let existing = repo::find_by_id(&self.pool, id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Invoice"))?;

        let changes = request.into_changes(existing.paid_at, Utc::now())?;
        repo::update(&self.pool, id, &changes)
            .await?
            .ok_or_else(|| ServiceError::not_found("Invoice"))
    }

    pub async fn delete(&self, principal: &Principal, id: Uuid) -> Result<(), ServiceError> {
        require_role(principal, Role::Admin)?;
        if !repo::delete(&self.pool, id).await? {
            return Err(ServiceError::not_found("Invoice"));
        }
        info!("Invoice {} deleted by {}", id, principal.email);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use serde_json::json;

    fn request(extra: serde_json::Value) -> InvoiceRequest {
        let mut body = json!({
            "amount": "2500.00",
            "due_date": "2026-11-30T00:00:00Z",
            "client_id": Uuid::new_v4(),
            "project_id": Uuid::new_v4()
        });
        if let (Some(body), Some(extra)) = (body.as_object_mut(), extra.as_object()) {
            body.extend(extra.clone());
        }
        serde_json::from_value(body).unwrap()
    }

    #[test]
    fn defaults_to_unpaid_usd() {
        let changes = request(json!({})).into_changes(None, Utc::now()).unwrap();
        assert_eq!(changes.currency, "USD");
        assert_eq!(changes.status, InvoiceStatus::Pending);
        assert!(!changes.paid);
        assert!(changes.paid_at.is_none());
    }

    #[test]
    fn paid_status_stamps_paid_at_once() {
        let now = Utc::now();
        let changes = request(json!({ "status": "PAID" })).into_changes(None, now).unwrap();
        assert!(changes.paid);
        assert_eq!(changes.paid_at, Some(now));

        let earlier = now - Duration::days(5);
        let again = request(json!({ "paid": true })).into_changes(Some(earlier), now).unwrap();
        assert_eq!(again.paid_at, Some(earlier));

        let reopened = request(json!({ "status": "SENT" })).into_changes(Some(earlier), now).unwrap();
        assert!(reopened.paid_at.is_none());
    }

    #[test]
    fn rejects_non_positive_amount_and_bad_currency() {
        let Err(ServiceError::Validation(fields)) =
            request(json!({ "amount": 0, "currency": "EURO" })).into_changes(None, Utc::now())
        else {
            panic!("invalid invoice accepted");
        };
        assert_eq!(fields["amount"], "Amount must be greater than 0");
        assert_eq!(fields["currency"], "Currency must be a 3 letter code");
    }

    #[test]
    fn currency_is_upper_cased() {
        let changes = request(json!({ "currency": "eur" })).into_changes(None, Utc::now()).unwrap();
        assert_eq!(changes.currency, "EUR");
    }
}
