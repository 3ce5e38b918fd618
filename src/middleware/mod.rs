pub mod auth;
pub mod response;

pub use auth::{access_guard, session_middleware};
pub use response::{ApiResponse, ApiResult};
