// handlers/protected/mod.rs - Protected handlers (JWT authentication required)
//
// Route prefix: /api/*
// Middleware: jwt_auth_middleware, then admin_only / staff_only / responsible_only
// depending on the route group (see main.rs).
//
// Staff handlers resolve the caller's `Scope` from the token: admins see every
// daycare, office managers only their own.

pub mod age_ranges;
pub mod allergies;
pub mod auth;
pub mod children;
pub mod classes;
pub mod daycares;
pub mod instructions;
pub mod me;
pub mod office_managers;
pub mod responsibles;
