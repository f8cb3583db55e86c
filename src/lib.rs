//! sitefeedback - Page Feedback Service
//!
//! A pluggable feedback-collection service: site visitors rate a page and
//! optionally leave a message; site editors view aggregated sentiment and
//! individual messages through an authenticated API.
//!
//! The core of the crate is the duplicate-submission prevention protocol in
//! [`backend::feedback::backends`]: a backend abstraction deciding whether a
//! visitor already gave feedback for a page, across multiple identity
//! strategies (client network address, server-side session, or per-page
//! custom logic with a fallback chain).

pub mod backend;
