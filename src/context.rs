//! The per-request context bag.
//!
//! Everything the lifecycle hooks derive for one request lives here instead
//! of in ambient globals: the resolved user, the originating host, the
//! session handle, the database connection, and the start instant. Created
//! at request start, discarded at request end.

use std::sync::Arc;
use std::time::Instant;

use crate::auth::User;
use crate::db::Connection;
use crate::session::Session;

/// Request-scoped context, reachable from handlers via
/// [`Request::ctx`](crate::Request::ctx).
///
/// Cloning is cheap (the session and connection are shared handles), which
/// lets the dispatch pipeline keep a copy across the handler call for the
/// teardown hook.
#[derive(Clone)]
pub struct Ctx {
    /// The authenticated user, when the session resolved to one.
    pub user: Option<User>,
    /// Originating host from `X-Real-Host`, empty when absent.
    pub host: String,
    pub is_logged: bool,
    pub is_superuser: bool,
    pub(crate) local_dev: bool,
    pub(crate) session: Session,
    pub(crate) db: Option<Arc<dyn Connection>>,
    pub(crate) started: Instant,
}

impl Ctx {
    /// The session handle; `set_userid` here is how a login handler signs
    /// a user in.
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// The per-request database connection, once the before hook has
    /// acquired it.
    pub fn db(&self) -> Option<&Arc<dyn Connection>> {
        self.db.as_ref()
    }

    pub fn local_dev(&self) -> bool {
        self.local_dev
    }
}

impl Default for Ctx {
    fn default() -> Self {
        Self {
            user: None,
            host: String::new(),
            is_logged: false,
            is_superuser: false,
            local_dev: false,
            session: Session::empty(),
            db: None,
            started: Instant::now(),
        }
    }
}
