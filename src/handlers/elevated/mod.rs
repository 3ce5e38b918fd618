// handlers/elevated/mod.rs - Elevated handlers (ADMIN session required)
//
// The access guard refuses /api/users for any other role with 403 before a
// handler runs; the user service checks the role again.
//
// Security Level: Session with role ADMIN
// Route Prefix: /api/users/*, /api/admin/*

pub mod users;
