/**
 * Network-Address Backend
 *
 * Detects duplicates by client network address scoped to a page: a
 * submission is a repeat when any existing record carries the same address
 * for the same page.
 *
 * `end_check` is a no-op - the record's own `ip_address` column, stamped at
 * insert time, is the durable fact, so no side table is needed.
 *
 * The phases are not tracked separately: the record created in the rating
 * phase matches the same (address, page) lookup in the message phase, so
 * under this strategy the follow-up message step is always rejected as a
 * repeat. Deployments that collect messages use the session strategy.
 *
 * Network addresses are shared (NAT, proxies), so this is an approximate,
 * privacy-light heuristic: repeats from a different address are not caught,
 * and collisions across a shared address are accepted.
 */

use async_trait::async_trait;
use sqlx::SqlitePool;

use crate::backend::error::FeedbackError;
use crate::backend::feedback::backends::{BackendOptions, FeedbackBackend};
use crate::backend::feedback::context::RequestContext;
use crate::backend::feedback::form::FeedbackForm;
use crate::backend::feedback::model::{exists_for_ip, Feedback};
use crate::backend::feedback::pages::FeedbackPage;

/// Resolve the client address a submission should be attributed to
///
/// With `trust_forwarded_for` set, takes the right-most comma-separated
/// entry of `X-Forwarded-For` (the hop added by the trusted proxy), trimmed;
/// otherwise the direct peer address. `None` when neither is available.
pub fn client_address(request: &RequestContext, trust_forwarded_for: bool) -> Option<String> {
    if trust_forwarded_for {
        request.forwarded_for.as_ref().and_then(|header| {
            header
                .rsplit(',')
                .next()
                .map(str::trim)
                .filter(|addr| !addr.is_empty())
                .map(str::to_string)
        })
    } else {
        request.remote_addr.map(|addr| addr.to_string())
    }
}

/// Duplicate detection scoped by (client address, page)
pub struct IpBackend {
    pool: SqlitePool,
    trust_forwarded_for: bool,
}

impl IpBackend {
    pub fn new(pool: SqlitePool, options: &BackendOptions) -> Self {
        Self {
            pool,
            trust_forwarded_for: options.trust_forwarded_for.unwrap_or(false),
        }
    }

    /// Post-construction configuration hook
    pub fn configured(mut self, configure: impl FnOnce(&mut Self)) -> Self {
        configure(&mut self);
        self
    }

    pub fn set_trust_forwarded_for(&mut self, trust: bool) {
        self.trust_forwarded_for = trust;
    }
}

#[async_trait]
impl FeedbackBackend for IpBackend {
    async fn is_duplicate(
        &self,
        request: Option<&RequestContext>,
        page: &dyn FeedbackPage,
        _form: &FeedbackForm,
        _exists: bool,
    ) -> Result<bool, FeedbackError> {
        let request = request.ok_or_else(|| {
            FeedbackError::contract(
                "A request must be available to derive the client address for the duplicate check.",
            )
        })?;

        let address = client_address(request, self.trust_forwarded_for);
        let duplicate = exists_for_ip(&self.pool, address.as_deref(), page.id()).await?;

        Ok(duplicate)
    }

    async fn end_check(
        &self,
        _request: Option<&RequestContext>,
        _page: &dyn FeedbackPage,
        _form: &FeedbackForm,
        _record: &Feedback,
        _exists: bool,
    ) -> Result<(), FeedbackError> {
        // The record's stored address is the durable fact.
        Ok(())
    }
}
