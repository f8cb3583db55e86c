//! HTTP Handlers
//!
//! Request handlers for the feedback service, split by audience:
//!
//! - **`public`** - the visitor-facing submission workflow
//! - **`admin`** - the editor-facing listing, aggregation and delete API

pub mod admin;
pub mod public;
