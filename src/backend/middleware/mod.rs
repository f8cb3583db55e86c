//! Middleware
//!
//! Request middleware for the feedback service. Currently only the admin
//! bearer-token authentication guarding the editor-facing API.

pub mod auth;

pub use auth::{admin_auth_middleware, create_admin_token, verify_admin_token, AdminUser};
