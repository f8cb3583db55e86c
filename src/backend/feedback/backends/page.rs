/**
 * Page-Delegating Backend
 *
 * Lets individual pages override feedback-duplication policy without
 * changing global configuration, while preserving a fallback chain:
 *
 * 1. If the page carries its own `PageFeedbackend` capability, both
 *    operations delegate entirely to it - the backup is never consulted.
 * 2. Otherwise, if a backup backend is configured, delegate to it.
 * 3. Otherwise behave like the default backend: never duplicate, no action.
 *
 * The backup is resolved through the factory at construction time from the
 * nested `backup_backend` / `backup_backend_options` configuration.
 */

use async_trait::async_trait;

use crate::backend::error::FeedbackError;
use crate::backend::feedback::backends::{
    get_feedback_backend, BackendEnv, BackendOptions, FeedbackBackend,
};
use crate::backend::feedback::context::RequestContext;
use crate::backend::feedback::form::FeedbackForm;
use crate::backend::feedback::model::Feedback;
use crate::backend::feedback::pages::FeedbackPage;

/// Backend that defers to the page itself, with a configurable backup chain
pub struct PageBackend {
    backup: Option<Box<dyn FeedbackBackend>>,
}

impl PageBackend {
    pub fn new(options: &BackendOptions, env: &BackendEnv) -> Result<Self, FeedbackError> {
        let backup = match &options.backup_backend {
            Some(class) => {
                let backup_options = options
                    .backup_backend_options
                    .as_deref()
                    .cloned()
                    .unwrap_or_default();
                Some(get_feedback_backend(env, Some(class), Some(&backup_options))?)
            }
            None => None,
        };

        Ok(Self { backup })
    }

    /// A delegating backend with an explicit backup (tests, custom wiring)
    pub fn with_backup(backup: Option<Box<dyn FeedbackBackend>>) -> Self {
        Self { backup }
    }
}

#[async_trait]
impl FeedbackBackend for PageBackend {
    async fn is_duplicate(
        &self,
        request: Option<&RequestContext>,
        page: &dyn FeedbackPage,
        form: &FeedbackForm,
        exists: bool,
    ) -> Result<bool, FeedbackError> {
        if let Some(feedbackend) = page.feedbackend() {
            return feedbackend
                .check_for_feedback_duplicate(request, form, exists)
                .await;
        }

        if let Some(backup) = &self.backup {
            return backup.is_duplicate(request, page, form, exists).await;
        }

        Ok(false)
    }

    async fn end_check(
        &self,
        request: Option<&RequestContext>,
        page: &dyn FeedbackPage,
        form: &FeedbackForm,
        record: &Feedback,
        exists: bool,
    ) -> Result<(), FeedbackError> {
        if let Some(feedbackend) = page.feedbackend() {
            return feedbackend
                .end_feedback_check(request, form, record, exists)
                .await;
        }

        if let Some(backup) = &self.backup {
            return backup.end_check(request, page, form, record, exists).await;
        }

        Ok(())
    }
}
