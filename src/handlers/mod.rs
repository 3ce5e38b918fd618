// handlers/mod.rs - 3-Tier Handler Architecture
//
// Public (no session) -> Protected (session) -> Elevated (ADMIN session).
// Routing and the middleware stack live in `routes.rs`.

pub mod elevated;
pub mod protected;
pub mod public;

use axum::Json;
use axum_extra::extract::WithRejection;

use crate::error::ApiError;

/// JSON request body whose rejection renders as an `ApiError`
pub type JsonBody<T> = WithRejection<Json<T>, ApiError>;
