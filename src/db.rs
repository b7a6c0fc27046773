//! The database collaborator seam.
//!
//! plinth never manages pooling or schema. The application hands it a
//! [`Database`], the before hook acquires one [`Connection`] per request,
//! and the teardown hook closes it — always, also when the handler fails.

use std::sync::Arc;

use async_trait::async_trait;

use crate::auth::User;

/// Failures reported by the database collaborator.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("database unavailable: {0}")]
    Unavailable(String),

    #[error("lookup failed: {0}")]
    Lookup(String),
}

/// One request's database handle.
#[async_trait]
pub trait Connection: Send + Sync {
    /// Releases the handle. Called exactly once, from the teardown hook.
    async fn close(&self);
}

/// The external database collaborator.
///
/// plinth only ever calls [`acquire`](Database::acquire) and
/// [`user_by_id`](Database::user_by_id); everything else about storage
/// belongs to the application.
#[async_trait]
pub trait Database: Send + Sync {
    /// Opens the connection for one request.
    async fn acquire(&self) -> Result<Arc<dyn Connection>, DbError>;

    /// Resolves the session's stored user id to a user record.
    ///
    /// `Ok(None)` means the id is unknown — the caller clears the session.
    async fn user_by_id(&self, id: &str) -> Result<Option<User>, DbError>;
}
