/**
 * Submission Extension Hooks
 *
 * The submission workflow exposes four extension points, mirroring its two
 * phases:
 *
 * - `before_feedback_form_valid` / `before_feedback_message_form_valid` -
 *   run before validation; a hook may reject the submission by returning a
 *   `ValidationError`, which is folded into the form's non-field errors
 *   rather than propagating as a fatal error. The first rejection stops the
 *   remaining hooks of that point.
 * - `after_feedback_form_valid` / `after_feedback_message_form_valid` - run
 *   after the record is persisted; observers only.
 *
 * The registry is populated at startup and passed into `AppState`; handlers
 * never reach for ambient global state.
 */

use std::sync::Arc;

use crate::backend::feedback::context::RequestContext;
use crate::backend::feedback::form::FeedbackForm;
use crate::backend::feedback::model::Feedback;

/// A validation rejection raised by a before-hook
#[derive(Debug, Clone)]
pub struct ValidationError(pub String);

impl ValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Hook invoked before a form is validated; may reject the submission
pub type BeforeHook =
    Arc<dyn Fn(Option<&RequestContext>, &FeedbackForm) -> Result<(), ValidationError> + Send + Sync>;

/// Hook invoked after a record is persisted
pub type AfterHook = Arc<dyn Fn(Option<&RequestContext>, &Feedback) + Send + Sync>;

/// Extension points for both submission phases
#[derive(Clone, Default)]
pub struct HookRegistry {
    before_feedback: Vec<BeforeHook>,
    after_feedback: Vec<AfterHook>,
    before_message: Vec<BeforeHook>,
    after_message: Vec<AfterHook>,
}

impl HookRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn before_feedback_form_valid(
        &mut self,
        hook: impl Fn(Option<&RequestContext>, &FeedbackForm) -> Result<(), ValidationError>
            + Send
            + Sync
            + 'static,
    ) -> &mut Self {
        self.before_feedback.push(Arc::new(hook));
        self
    }

    pub fn after_feedback_form_valid(
        &mut self,
        hook: impl Fn(Option<&RequestContext>, &Feedback) + Send + Sync + 'static,
    ) -> &mut Self {
        self.after_feedback.push(Arc::new(hook));
        self
    }

    pub fn before_feedback_message_form_valid(
        &mut self,
        hook: impl Fn(Option<&RequestContext>, &FeedbackForm) -> Result<(), ValidationError>
            + Send
            + Sync
            + 'static,
    ) -> &mut Self {
        self.before_message.push(Arc::new(hook));
        self
    }

    pub fn after_feedback_message_form_valid(
        &mut self,
        hook: impl Fn(Option<&RequestContext>, &Feedback) + Send + Sync + 'static,
    ) -> &mut Self {
        self.after_message.push(Arc::new(hook));
        self
    }

    fn run_before(
        hooks: &[BeforeHook],
        request: Option<&RequestContext>,
        form: &mut FeedbackForm,
    ) {
        for hook in hooks {
            if let Err(error) = hook(request, form) {
                form.add_error(None, error.0);
                break;
            }
        }
    }

    /// Run the pre-validation hooks for the rating phase
    pub fn run_before_feedback(&self, request: Option<&RequestContext>, form: &mut FeedbackForm) {
        Self::run_before(&self.before_feedback, request, form);
    }

    /// Run the pre-validation hooks for the message phase
    pub fn run_before_message(&self, request: Option<&RequestContext>, form: &mut FeedbackForm) {
        Self::run_before(&self.before_message, request, form);
    }

    /// Notify observers of a persisted initial submission
    pub fn run_after_feedback(&self, request: Option<&RequestContext>, record: &Feedback) {
        for hook in &self.after_feedback {
            hook(request, record);
        }
    }

    /// Notify observers of a persisted follow-up message
    pub fn run_after_message(&self, request: Option<&RequestContext>, record: &Feedback) {
        for hook in &self.after_message {
            hook(request, record);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::feedback::form::FeedbackPayload;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_rejection_is_folded_into_non_field_errors() {
        let mut registry = HookRegistry::new();
        registry.before_feedback_form_valid(|_, _| Err(ValidationError::new("not today")));

        let mut form = FeedbackForm::rating(&FeedbackPayload {
            positive: Some(true),
            message: None,
        });
        registry.run_before_feedback(None, &mut form);

        assert_eq!(form.errors.non_field, vec!["not today"]);
        assert!(!form.is_valid());
    }

    #[test]
    fn test_first_rejection_stops_remaining_hooks() {
        let calls = Arc::new(AtomicUsize::new(0));
        let later = calls.clone();

        let mut registry = HookRegistry::new();
        registry
            .before_feedback_form_valid(|_, _| Err(ValidationError::new("stop")))
            .before_feedback_form_valid(move |_, _| {
                later.fetch_add(1, Ordering::SeqCst);
                Ok(())
            });

        let mut form = FeedbackForm::rating(&FeedbackPayload::default());
        registry.run_before_feedback(None, &mut form);

        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(form.errors.non_field.len(), 1);
    }

    #[test]
    fn test_after_hooks_observe_the_record() {
        let seen = Arc::new(AtomicUsize::new(0));
        let sink = seen.clone();

        let mut registry = HookRegistry::new();
        registry.after_feedback_form_valid(move |_, record| {
            sink.store(record.id as usize, Ordering::SeqCst);
        });

        let record = Feedback {
            id: 42,
            positive: false,
            message: None,
            page_id: 1,
            created_at: chrono::Utc::now(),
            ip_address: None,
        };
        registry.run_after_feedback(None, &record);

        assert_eq!(seen.load(Ordering::SeqCst), 42);
    }
}
