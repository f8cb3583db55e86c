//! Routes Module
//!
//! Router assembly and the URL construction/reversal helpers backing the
//! serialized record's related-resource URL set.

pub mod router;
pub mod urls;

pub use router::create_router;
