//! Server Module
//!
//! Configuration loading, application state and server assembly.

pub mod config;
pub mod init;
pub mod state;

pub use config::AppConfig;
pub use init::{build_state, create_app, create_app_with};
pub use state::AppState;
