// handlers/public/mod.rs - Public handlers (no session required)
//
// Landing, health, sign-in and the unauthorized page. The access guard lets
// these through for anonymous callers; `/` alone redirects a signed-in user
// to their dashboard before reaching `root`.
//
// Security Level: None
// Route Prefix: /, /health, /auth/*, /unauthorized

pub mod pages;
pub mod signin;

pub use pages::{health, root, unauthorized};
pub use signin::{signin_page, signin_post, signout_post};
