//! Feedback Service Backend
//!
//! The server side of the feedback add-on: visitors rate a page (positive or
//! negative) and optionally leave a message; editors read aggregated
//! sentiment and individual messages through the admin API.
//!
//! The heart of the crate is `feedback::backends`, the pluggable
//! duplicate-submission prevention protocol; everything else is plumbing
//! around it.
//!
//! # Module Structure
//!
//! ```text
//! backend/
//! ├── error/      - Error types and HTTP conversion
//! ├── feedback/   - Domain: records, pages, forms, sessions, backends
//! ├── handlers/   - Public submission workflow and admin API
//! ├── middleware/ - Admin bearer-token authentication
//! ├── routes/     - Router assembly and URL helpers
//! └── server/     - Configuration, state and initialization
//! ```

pub mod error;
pub mod feedback;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod server;
