// handlers/protected/mod.rs - Protected handlers (session required)
//
// Every handler takes the signed-in `Principal`; the service it calls checks
// the role again before touching the database, so a route reached by an
// unexpected role still answers 403 "Unauthorized".
//
// Security Level: Session required (cookie or Bearer token)
// Route Prefix: /api/*, /dashboard/*
// Middleware: session_middleware + access_guard

pub mod dashboard;
pub mod invoices;
pub mod messages;
pub mod projects;
pub mod session;
pub mod tasks;
pub mod teams;
