//! Feedback Domain Module
//!
//! Everything the feedback subsystem owns: the persisted records and pages,
//! the two-phase submission form, the visitor session store, the request
//! context, the extension hooks, and - at the center - the pluggable
//! duplicate-submission backends.
//!
//! # Module Structure
//!
//! ```text
//! feedback/
//! ├── mod.rs           - Module exports
//! ├── model.rs         - Feedback records and queries (list, aggregate)
//! ├── pages.rs         - Page rows and feedback capabilities
//! ├── form.rs          - Two-phase submission form and validation
//! ├── context.rs       - Per-request context handed to the backends
//! ├── session_store.rs - Server-side visitor session flags
//! ├── hooks.rs         - Submission extension points
//! └── backends/        - The duplicate-detection strategies
//! ```

pub mod backends;
pub mod context;
pub mod form;
pub mod hooks;
pub mod model;
pub mod pages;
pub mod session_store;

pub use backends::{
    get_feedback_backend, BackendConfig, BackendEnv, BackendOptions, BackendRegistry,
    DefaultBackend, FeedbackBackend,
};
pub use context::{ClientInfo, RequestContext};
pub use form::{FeedbackForm, FeedbackPayload, FormErrors};
pub use hooks::{HookRegistry, ValidationError};
pub use model::{Feedback, FeedbackFilter, NewFeedback};
pub use pages::{FeedbackPage, Page, PageFeedbackend};
pub use session_store::SessionStore;
