/**
 * Feedback Forms
 *
 * This module implements the two-phase submission form:
 *
 * - **Rating phase** (`exists = false`): only the `positive` field is
 *   accepted; the message field is dropped entirely.
 * - **Message phase** (`exists = true`): only the `message` field is
 *   accepted, and it is required to be non-blank.
 *
 * Validation failures are recoverable: they are collected as field and
 * non-field errors and surfaced back to the submitter as a 422 payload, never
 * as a fatal error. Extension hooks may also inject non-field errors before
 * validation runs.
 */

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Raw submission body accepted by both public endpoints
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FeedbackPayload {
    /// The rating; required in the rating phase, ignored afterwards
    #[serde(default)]
    pub positive: Option<bool>,
    /// The message; required in the message phase, ignored before
    #[serde(default)]
    pub message: Option<String>,
}

/// Collected validation errors, serializable for re-render payloads
#[derive(Debug, Clone, Default, Serialize)]
pub struct FormErrors {
    /// Per-field error messages
    pub fields: BTreeMap<String, Vec<String>>,
    /// Errors not attributable to a single field (e.g. hook rejections)
    pub non_field: Vec<String>,
}

impl FormErrors {
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.non_field.is_empty()
    }
}

/// A bound feedback form for one submission phase
#[derive(Debug, Clone)]
pub struct FeedbackForm {
    /// The submitted rating, if this is the rating phase
    pub positive: Option<bool>,
    /// The submitted message, if this is the message phase
    pub message: Option<String>,
    /// Whether this form is the message phase
    pub requires_message: bool,
    /// Errors collected by validation and hooks
    pub errors: FormErrors,
}

impl FeedbackForm {
    /// Bind a rating-phase form (`exists = false`)
    ///
    /// The message field is dropped: the initial submission only carries the
    /// rating, and the follow-up step owns the message.
    pub fn rating(payload: &FeedbackPayload) -> Self {
        Self {
            positive: payload.positive,
            message: None,
            requires_message: false,
            errors: FormErrors::default(),
        }
    }

    /// Bind a message-phase form (`exists = true`)
    ///
    /// The rating field is dropped: the record already holds it.
    pub fn message(payload: &FeedbackPayload) -> Self {
        Self {
            positive: None,
            message: payload.message.clone(),
            requires_message: true,
            errors: FormErrors::default(),
        }
    }

    /// Attach an error to a field, or to the non-field list when `field` is None
    pub fn add_error(&mut self, field: Option<&str>, message: impl Into<String>) {
        match field {
            Some(field) => self
                .errors
                .fields
                .entry(field.to_string())
                .or_default()
                .push(message.into()),
            None => self.errors.non_field.push(message.into()),
        }
    }

    /// Run validation and report whether the form is clean
    ///
    /// Errors injected earlier (by hooks) also make the form invalid.
    pub fn is_valid(&mut self) -> bool {
        if self.requires_message {
            match &self.message {
                Some(message) if !message.trim().is_empty() => {}
                _ => self.add_error(Some("message"), "You must provide a message."),
            }
        } else if self.positive.is_none() {
            self.add_error(Some("positive"), "A rating is required.");
        }

        self.errors.is_empty()
    }
}
