use sqlx::PgExecutor;
use uuid::Uuid;

use crate::database::manager::DatabaseError;
use crate::database::models::invoice::{Invoice, InvoiceChanges, InvoiceRow};

const COLUMNS: &str = "id, invoice_number, amount, currency, paid, status, notes, due_date, paid_at, \
                       client_id, project_id, created_at, updated_at";

const LISTING: &str = r#"
    SELECT i.id, i.invoice_number, i.amount, i.currency, i.paid, i.status, i.notes, i.due_date,
           i.paid_at, i.client_id, i.project_id, i.created_at, i.updated_at,
           c.name AS client_name, p.name AS project_name
    FROM invoices i
    JOIN users c ON c.id = i.client_id
    JOIN projects p ON p.id = i.project_id
"#;

/// All invoices, or only those billed to `client_id`
pub async fn list<'e>(db: impl PgExecutor<'e>, client_id: Option<Uuid>) -> Result<Vec<InvoiceRow>, DatabaseError> {
    let sql = match client_id {
        Some(_) => format!("{LISTING} WHERE i.client_id = $1 ORDER BY i.created_at DESC"),
        None => format!("{LISTING} ORDER BY i.created_at DESC"),
    };
    let mut query = sqlx::query_as::<_, InvoiceRow>(&sql);
    if let Some(id) = client_id {
        query = query.bind(id);
    }
    Ok(query.fetch_all(db).await?)
}

pub async fn find_by_id<'e>(db: impl PgExecutor<'e>, id: Uuid) -> Result<Option<Invoice>, DatabaseError> {
    let invoice = sqlx::query_as::<_, Invoice>(&format!("SELECT {COLUMNS} FROM invoices WHERE id = $1"))
        .bind(id)
        .fetch_optional(db)
        .await?;
    Ok(invoice)
}

pub async fn insert<'e>(db: impl PgExecutor<'e>, changes: &InvoiceChanges) -> Result<Invoice, DatabaseError> {
    let invoice = sqlx::query_as::<_, Invoice>(&format!(
        "INSERT INTO invoices (amount, currency, paid, status, notes, due_date, paid_at, client_id, project_id) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) RETURNING {COLUMNS}"
    ))
    .bind(changes.amount)
    .bind(&changes.currency)
    .bind(changes.paid)
    .bind(changes.status)
    .bind(&changes.notes)
    .bind(changes.due_date)
    .bind(changes.paid_at)
    .bind(changes.client_id)
    .bind(changes.project_id)
    .fetch_one(db)
    .await?;
    Ok(invoice)
}

pub async fn update<'e>(
    db: impl PgExecutor<'e>,
    id: Uuid,
    changes: &InvoiceChanges,
) -> Result<Option<Invoice>, DatabaseError> {
    let invoice = sqlx::query_as::<_, Invoice>(&format!(
        "UPDATE invoices SET amount = $2, currency = $3, paid = $4, status = $5, notes = $6, due_date = $7, \
         paid_at = $8, client_id = $9, project_id = $10, updated_at = NOW() \
         WHERE id = $1 RETURNING {COLUMNS}"
    ))
    .bind(id)
    .bind(changes.amount)
    .bind(&changes.currency)
    .bind(changes.paid)
    .bind(changes.status)
    .bind(&changes.notes)
    .bind(changes.due_date)
    .bind(changes.paid_at)
    .bind(changes.client_id)
    .bind(changes.project_id)
    .fetch_optional(db)
    .await?;
    Ok(invoice)
}

pub async fn delete<'e>(db: impl PgExecutor<'e>, id: Uuid) -> Result<bool, DatabaseError> {
    let result = sqlx::query("DELETE FROM invoices WHERE id = $1")
        .bind(id)
        .execute(db)
        .await?;
    Ok(result.rows_affected() > 0)
}
