//! SQL for each table. Every function takes any Postgres executor so callers can
//! run it against the pool or inside a transaction.

pub mod invoices;
pub mod messages;
pub mod projects;
pub mod tasks;
pub mod teams;
pub mod users;
