/**
 * Session Backend
 *
 * Detects duplicates through server-side session state, keyed per page and
 * per submission phase. Two independent flags are kept for every page:
 *
 * - the rated key guards the initial rating (`exists = false`)
 * - the message key guards the follow-up message (`exists = true`)
 *
 * Keeping the phases on separate keys means a visitor who rated but skipped
 * the message step can still be offered (or blocked from) the message step
 * on its own tracking state.
 *
 * Key templates are configurable; `{page}` is replaced with the page's
 * identity.
 */

use async_trait::async_trait;

use crate::backend::error::FeedbackError;
use crate::backend::feedback::backends::{BackendOptions, FeedbackBackend};
use crate::backend::feedback::context::RequestContext;
use crate::backend::feedback::form::FeedbackForm;
use crate::backend::feedback::model::Feedback;
use crate::backend::feedback::pages::FeedbackPage;
use crate::backend::feedback::session_store::Session;

/// Default template for the rating-phase flag
pub const DEFAULT_RATED_KEY: &str = "feedback-rated-{page}";
/// Default template for the message-phase flag
pub const DEFAULT_MESSAGE_KEY: &str = "feedback-message-{page}";

/// Duplicate detection backed by per-page, per-phase session flags
pub struct SessionBackend {
    rated_key: String,
    message_key: String,
}

impl SessionBackend {
    pub fn new(options: &BackendOptions) -> Self {
        Self {
            rated_key: options
                .rated_key
                .clone()
                .unwrap_or_else(|| DEFAULT_RATED_KEY.to_string()),
            message_key: options
                .message_key
                .clone()
                .unwrap_or_else(|| DEFAULT_MESSAGE_KEY.to_string()),
        }
    }

    /// Post-construction configuration hook
    pub fn configured(mut self, configure: impl FnOnce(&mut Self)) -> Self {
        configure(&mut self);
        self
    }

    pub fn set_key_templates(&mut self, rated_key: String, message_key: String) {
        self.rated_key = rated_key;
        self.message_key = message_key;
    }

    /// The phase-appropriate key, formatted for this page
    fn key(&self, page: &dyn FeedbackPage, exists: bool) -> String {
        let template = if exists { &self.message_key } else { &self.rated_key };
        template.replace("{page}", &page.id().to_string())
    }

    fn session<'a>(
        &self,
        request: Option<&'a RequestContext>,
    ) -> Result<&'a Session, FeedbackError> {
        request
            .and_then(|request| request.session.as_ref())
            .ok_or_else(|| {
                FeedbackError::contract(
                    "A request with a session must be available for the session backend.",
                )
            })
    }
}

#[async_trait]
impl FeedbackBackend for SessionBackend {
    async fn is_duplicate(
        &self,
        request: Option<&RequestContext>,
        page: &dyn FeedbackPage,
        _form: &FeedbackForm,
        exists: bool,
    ) -> Result<bool, FeedbackError> {
        let session = self.session(request)?;
        Ok(session.flag(&self.key(page, exists)).await)
    }

    async fn end_check(
        &self,
        request: Option<&RequestContext>,
        page: &dyn FeedbackPage,
        _form: &FeedbackForm,
        _record: &Feedback,
        exists: bool,
    ) -> Result<(), FeedbackError> {
        let session = self.session(request)?;
        session.set(&self.key(page, exists)).await;
        Ok(())
    }
}
