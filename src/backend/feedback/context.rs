/**
 * Request Context
 *
 * This module carries the per-request facts the duplicate-detection backends
 * decide on: the direct peer address, the raw forwarded-for header, and the
 * visitor's session handle. The context is ephemeral; nothing in it is
 * persisted.
 *
 * `ClientInfo` is the axum extractor that assembles a context from an
 * incoming request. It never fails: missing pieces stay `None`, and the
 * backends that require them raise contract violations themselves.
 */

use axum::extract::{ConnectInfo, FromRequestParts};
use axum::http::request::Parts;
use std::convert::Infallible;
use std::net::{IpAddr, SocketAddr};

use crate::backend::feedback::session_store::{session_cookie, session_id_from_headers, Session};
use crate::backend::server::state::AppState;

/// Forwarded-for header honored when the service sits behind a proxy
pub const X_FORWARDED_FOR: &str = "x-forwarded-for";

/// Ephemeral request facts handed to the backends
#[derive(Clone)]
pub struct RequestContext {
    /// Direct peer address, when the listener exposes it
    pub remote_addr: Option<IpAddr>,
    /// Raw `X-Forwarded-For` header value, if any
    pub forwarded_for: Option<String>,
    /// The visitor's session handle
    pub session: Option<Session>,
}

/// Extractor producing a `RequestContext` plus the Set-Cookie value to issue
/// when the visitor had no session yet
pub struct ClientInfo {
    pub context: RequestContext,
    pub set_cookie: Option<String>,
}

impl FromRequestParts<AppState> for ClientInfo {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let remote_addr = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|info| info.0.ip());

        let forwarded_for = parts
            .headers
            .get(X_FORWARDED_FOR)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);

        let (session, fresh) = state
            .sessions
            .open(session_id_from_headers(&parts.headers));

        let set_cookie = fresh.then(|| session_cookie(session.id));

        Ok(Self {
            context: RequestContext {
                remote_addr,
                forwarded_for,
                session: Some(session),
            },
            set_cookie,
        })
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::backend::feedback::session_store::SessionStore;

    /// A bare context with no session and no addresses
    pub fn empty_context() -> RequestContext {
        RequestContext {
            remote_addr: None,
            forwarded_for: None,
            session: None,
        }
    }

    /// A context with a fresh session from the given store
    pub fn session_context(store: &SessionStore) -> RequestContext {
        let (session, _) = store.open(None);
        RequestContext {
            remote_addr: None,
            forwarded_for: None,
            session: Some(session),
        }
    }

    /// A context with a direct peer address and optional forwarded header
    pub fn addr_context(remote: &str, forwarded: Option<&str>) -> RequestContext {
        RequestContext {
            remote_addr: Some(remote.parse().unwrap()),
            forwarded_for: forwarded.map(str::to_string),
            session: None,
        }
    }
}
