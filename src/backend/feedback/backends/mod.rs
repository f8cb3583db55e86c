/**
 * Duplicate-Submission Backends
 *
 * This module is the core of the feedback service: a pluggable protocol that
 * decides whether a visitor has already given feedback for a page, and
 * records that a submission happened.
 *
 * # The Contract
 *
 * Every strategy implements `FeedbackBackend`:
 *
 * - `is_duplicate` - a pure decision; must not mutate any state.
 * - `end_check` - fired exactly once after a successful, validated
 *   submission; records whatever side state the backend needs to detect
 *   future duplicates. The record itself is owned by the persistence layer;
 *   backends never create or delete records.
 *
 * The submission workflow distinguishes two phases through the `exists`
 * flag: `false` for the initial rating, `true` for the follow-up message
 * against an existing record.
 *
 * # Built-in Strategies
 *
 * - `default` - never duplicate, no action (the polymorphic root)
 * - `ip` - scoped by client network address (the configured default)
 * - `session` - two independent per-page session flags, one per phase
 * - `page` - defers to the page's own capability, with a backup chain
 *
 * # Resolution
 *
 * Backends are resolved through a `BackendRegistry` of string keys mapped to
 * constructor functions, populated at startup. `get_feedback_backend` picks
 * the explicit class/options when given, else the configured ones, and
 * instantiates per call - backends are cheap to construct and are not cached
 * across requests.
 */

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use std::collections::HashMap;
use std::sync::Arc;

use crate::backend::error::FeedbackError;
use crate::backend::feedback::context::RequestContext;
use crate::backend::feedback::form::FeedbackForm;
use crate::backend::feedback::model::Feedback;
use crate::backend::feedback::pages::FeedbackPage;

pub mod ip;
pub mod page;
pub mod session;

pub use ip::IpBackend;
pub use page::PageBackend;
pub use session::SessionBackend;

/// Pluggable duplicate-detection strategy
#[async_trait]
pub trait FeedbackBackend: Send + Sync {
    /// Decide whether this submission should be rejected as a repeat
    ///
    /// Pure decision; must not mutate backend state. `exists` is false for
    /// the initial rating and true for the follow-up message phase.
    async fn is_duplicate(
        &self,
        request: Option<&RequestContext>,
        page: &dyn FeedbackPage,
        form: &FeedbackForm,
        exists: bool,
    ) -> Result<bool, FeedbackError>;

    /// Record that a successful submission happened
    ///
    /// Called exactly once per successful, validated submission; not retried.
    async fn end_check(
        &self,
        request: Option<&RequestContext>,
        page: &dyn FeedbackPage,
        form: &FeedbackForm,
        record: &Feedback,
        exists: bool,
    ) -> Result<(), FeedbackError>;
}

/// The no-op root strategy: never a duplicate, no side state
#[derive(Debug, Clone, Default)]
pub struct DefaultBackend;

#[async_trait]
impl FeedbackBackend for DefaultBackend {
    async fn is_duplicate(
        &self,
        _request: Option<&RequestContext>,
        _page: &dyn FeedbackPage,
        _form: &FeedbackForm,
        _exists: bool,
    ) -> Result<bool, FeedbackError> {
        Ok(false)
    }

    async fn end_check(
        &self,
        _request: Option<&RequestContext>,
        _page: &dyn FeedbackPage,
        _form: &FeedbackForm,
        _record: &Feedback,
        _exists: bool,
    ) -> Result<(), FeedbackError> {
        Ok(())
    }
}

/// Static construction options shared by the built-in backends
///
/// Unknown strategies registered by applications read the fields they care
/// about and ignore the rest. Options are plain data; backends needing
/// derived configuration apply it in their constructors or through the
/// `configured` builder hook on the typed constructors.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BackendOptions {
    /// Honor `X-Forwarded-For` instead of the direct peer address
    #[serde(default)]
    pub trust_forwarded_for: Option<bool>,
    /// Session key template guarding the initial rating phase
    #[serde(default)]
    pub rated_key: Option<String>,
    /// Session key template guarding the message phase
    #[serde(default)]
    pub message_key: Option<String>,
    /// Backup strategy key for the page-delegating backend
    #[serde(default)]
    pub backup_backend: Option<String>,
    /// Options for the backup strategy
    #[serde(default)]
    pub backup_backend_options: Option<Box<BackendOptions>>,
}

/// Configured backend selection, resolved once at startup
#[derive(Debug, Clone)]
pub struct BackendConfig {
    /// Registry key of the active strategy
    pub class: String,
    /// Options handed to the strategy's constructor
    pub options: BackendOptions,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            class: "ip".to_string(),
            options: BackendOptions::default(),
        }
    }
}

/// Constructor function registered for one strategy key
pub type BackendConstructor =
    fn(&BackendOptions, &BackendEnv) -> Result<Box<dyn FeedbackBackend>, FeedbackError>;

/// Everything a constructor needs: the pool, the registry (so the delegating
/// backend can resolve its backup) and the configured selection
#[derive(Clone)]
pub struct BackendEnv {
    pub pool: SqlitePool,
    pub registry: Arc<BackendRegistry>,
    pub config: Arc<BackendConfig>,
}

/// String key to constructor mapping, populated at startup
///
/// Applications may register their own strategies next to the built-ins
/// before the registry is shared.
#[derive(Default)]
pub struct BackendRegistry {
    constructors: HashMap<String, BackendConstructor>,
}

impl BackendRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding the built-in strategies
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register("default", |_, _| Ok(Box::new(DefaultBackend)));
        registry.register("ip", |options, env| {
            Ok(Box::new(IpBackend::new(env.pool.clone(), options)))
        });
        registry.register("session", |options, _| {
            Ok(Box::new(SessionBackend::new(options)))
        });
        registry.register("page", |options, env| {
            Ok(Box::new(PageBackend::new(options, env)?))
        });
        registry
    }

    /// Register a strategy under a key, replacing any previous registration
    pub fn register(&mut self, key: impl Into<String>, constructor: BackendConstructor) {
        self.constructors.insert(key.into(), constructor);
    }

    pub fn get(&self, key: &str) -> Option<BackendConstructor> {
        self.constructors.get(key).copied()
    }
}

/// Resolve and instantiate the active backend
///
/// Falls back to the configured class and options when no explicit ones are
/// given. An empty or unknown key is a contract violation - with the
/// built-ins registered and the `ip` default this should never occur.
pub fn get_feedback_backend(
    env: &BackendEnv,
    class: Option<&str>,
    options: Option<&BackendOptions>,
) -> Result<Box<dyn FeedbackBackend>, FeedbackError> {
    let class = class.unwrap_or(&env.config.class);
    let options = options.unwrap_or(&env.config.options);

    if class.is_empty() {
        return Err(FeedbackError::contract("No feedback backend class specified."));
    }

    let constructor = env.registry.get(class).ok_or_else(|| {
        FeedbackError::contract(format!("No feedback backend registered for key `{class}`"))
    })?;

    constructor(options, env)
}
