/**
 * Visitor Session Store
 *
 * This module provides the server-side session state the session backend
 * tracks its duplicate flags in. Sessions are identified by a UUID carried in
 * the `feedback_session` cookie and hold a flat map of boolean flags keyed by
 * the backend's formatted key strings.
 *
 * # Thread Safety
 *
 * The store is an `Arc<RwLock<HashMap<...>>>` shared through `AppState`;
 * cloning it is cheap and all access is async.
 */

use axum::http::header::COOKIE;
use axum::http::HeaderMap;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Name of the visitor session cookie
pub const SESSION_COOKIE: &str = "feedback_session";

/// In-process store of visitor session flags
#[derive(Clone, Default)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<Uuid, HashMap<String, bool>>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a handle to an existing session, or mint a fresh one
    ///
    /// Returns the session plus whether it was newly created (in which case
    /// the handler should issue the cookie).
    pub fn open(&self, id: Option<Uuid>) -> (Session, bool) {
        match id {
            Some(id) => (
                Session {
                    id,
                    store: self.clone(),
                },
                false,
            ),
            None => (
                Session {
                    id: Uuid::new_v4(),
                    store: self.clone(),
                },
                true,
            ),
        }
    }

    async fn flag(&self, id: Uuid, key: &str) -> bool {
        self.sessions
            .read()
            .await
            .get(&id)
            .and_then(|flags| flags.get(key))
            .copied()
            .unwrap_or(false)
    }

    async fn set_flag(&self, id: Uuid, key: &str) {
        self.sessions
            .write()
            .await
            .entry(id)
            .or_default()
            .insert(key.to_string(), true);
    }
}

/// Handle to one visitor's session
#[derive(Clone)]
pub struct Session {
    pub id: Uuid,
    store: SessionStore,
}

impl Session {
    /// Whether a flag is set in this session
    pub async fn flag(&self, key: &str) -> bool {
        self.store.flag(self.id, key).await
    }

    /// Set a flag and persist it in the store
    pub async fn set(&self, key: &str) {
        self.store.set_flag(self.id, key).await;
    }
}

/// Extract the session ID from a request's Cookie header, if present
pub fn session_id_from_headers(headers: &HeaderMap) -> Option<Uuid> {
    let cookies = headers.get(COOKIE)?.to_str().ok()?;
    cookies.split(';').find_map(|pair| {
        let (name, value) = pair.trim().split_once('=')?;
        if name == SESSION_COOKIE {
            Uuid::parse_str(value.trim()).ok()
        } else {
            None
        }
    })
}

/// Build the Set-Cookie value that hands a session ID to the visitor
pub fn session_cookie(id: Uuid) -> String {
    format!("{SESSION_COOKIE}={id}; Path=/; HttpOnly; SameSite=Lax")
}
