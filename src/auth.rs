//! Roles, the authenticated user record, and route guards.
//!
//! Guards are handler combinators: they wrap a route handler and run an
//! authorization check before it. On failure the inner handler is never
//! called and the caller gets a 401 JSON body.
//!
//! ```rust,no_run
//! use plinth::{auth, Router};
//! use plinth::auth::Role;
//! # use plinth::{Request, Response};
//! # async fn list_users(_: Request) -> Response { Response::text("") }
//! # async fn whoami(_: Request) -> Response { Response::text("") }
//!
//! let app = Router::new()
//!     .get("/me",    auth::require_login(whoami))
//!     .get("/users", auth::require_role(Role::Superuser, list_users));
//! ```

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use http::StatusCode;
use serde::{Deserialize, Serialize};

use crate::handler::{AnyHandler, Handler};
use crate::json::ToApi;
use crate::reply;
use crate::request::Request;
use crate::response::Response;

// ── Role ─────────────────────────────────────────────────────────────────────

/// Coarse-grained authorization label on a user record.
///
/// The ordering contract is the variant order: `Disabled < User < Editor <
/// Superuser`. Guards compare with [`Role::is_at_least`], so a superuser
/// passes every role check and a disabled account passes none.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Disabled,
    User,
    Editor,
    Superuser,
}

impl Role {
    /// The string label stored on the user record.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Disabled => "disabled",
            Self::User => "user",
            Self::Editor => "editor",
            Self::Superuser => "superuser",
        }
    }

    /// True when `self` meets or exceeds `required` in the role ordering.
    ///
    /// `Disabled` never satisfies any requirement, including `Disabled`
    /// itself.
    pub fn is_at_least(self, required: Role) -> bool {
        self != Self::Disabled && self >= required
    }
}

/// A role label not in the known set.
#[derive(Debug, thiserror::Error)]
#[error("unknown role `{0}`")]
pub struct UnknownRole(String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "disabled" => Ok(Self::Disabled),
            "user" => Ok(Self::User),
            "editor" => Ok(Self::Editor),
            "superuser" => Ok(Self::Superuser),
            other => Err(UnknownRole(other.to_owned())),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── User ─────────────────────────────────────────────────────────────────────

/// The authenticated user record, resolved from the session's `userid` by
/// the [`Database`](crate::db::Database) collaborator.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
    pub role: Role,
}

impl ToApi for User {
    fn to_api(&self) -> serde_json::Value {
        serde_json::json!({
            "id": self.id,
            "name": self.name,
            "role": self.role.as_str(),
        })
    }
}

// ── Guards ───────────────────────────────────────────────────────────────────

/// Wraps `handler` so it only runs for an authenticated, non-disabled user.
///
/// Otherwise replies 401 with a JSON error body and logs a warning.
pub fn require_login(handler: impl Handler) -> impl Handler {
    guard(None, handler)
}

/// Wraps `handler` so it only runs for an authenticated user whose role is
/// at least `role`.
///
/// Otherwise replies 401 with a JSON error body and logs a warning.
pub fn require_role(role: Role, handler: impl Handler) -> impl Handler {
    guard(Some(role), handler)
}

/// Wraps `handler` so it only runs on a local development machine
/// ([`Config::is_local_dev`](crate::Config::is_local_dev)); everywhere else
/// it replies with an empty 200. Gates debug-only endpoints.
pub fn local_dev_only(handler: impl Handler) -> impl Handler {
    let inner = handler.into_boxed_handler();
    move |req: Request| {
        let inner = Arc::clone(&inner);
        async move {
            if req.ctx().local_dev() {
                inner.call(req).await
            } else {
                Response::text("")
            }
        }
    }
}

fn guard(role: Option<Role>, handler: impl Handler) -> impl Handler {
    let inner = handler.into_boxed_handler();
    move |req: Request| {
        let inner = Arc::clone(&inner);
        async move {
            match check_role(&req, role) {
                Some(denied) => denied,
                None => inner.call(req).await,
            }
        }
    }
}

/// Returns the 401 reply when the request's user is missing or below
/// `required`; `None` when the check passes.
fn check_role(req: &Request, required: Option<Role>) -> Option<Response> {
    let user = req.ctx().user.as_ref();
    let allowed = match (user, required) {
        (Some(u), Some(r)) => u.role.is_at_least(r),
        (Some(u), None) => u.role != Role::Disabled,
        (None, _) => false,
    };
    if allowed {
        return None;
    }
    let who = user.map_or("-", |u| u.id.as_str());
    Some(reply::warn_reply(
        &format!("Unauthorized! {} {} user={}", req.method(), req.path(), who),
        StatusCode::UNAUTHORIZED,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(role: Role) -> User {
        User { id: "u1".to_owned(), name: "test".to_owned(), role }
    }

    async fn ok_handler(_req: Request) -> Response {
        Response::text("inner")
    }

    #[test]
    fn role_ordering_is_explicit() {
        assert!(Role::Superuser.is_at_least(Role::Editor));
        assert!(Role::Superuser.is_at_least(Role::Superuser));
        assert!(Role::Editor.is_at_least(Role::User));
        assert!(!Role::User.is_at_least(Role::Editor));
        assert!(!Role::Disabled.is_at_least(Role::Disabled));
        assert!(!Role::Disabled.is_at_least(Role::User));
    }

    #[test]
    fn role_parses_from_db_labels() {
        assert_eq!("superuser".parse::<Role>().unwrap(), Role::Superuser);
        assert_eq!("disabled".parse::<Role>().unwrap(), Role::Disabled);
        assert!("root".parse::<Role>().is_err());
    }

    #[tokio::test]
    async fn anonymous_request_is_rejected() {
        let h = require_login(ok_handler).into_boxed_handler();
        let req = Request::builder().path("/me").build();
        let resp = h.call(req).await;
        assert_eq!(resp.status_code(), StatusCode::UNAUTHORIZED);
        let body = String::from_utf8(resp.body().to_vec()).unwrap();
        assert!(body.contains("401:"), "body: {body}");
    }

    #[tokio::test]
    async fn insufficient_role_is_rejected() {
        let h = require_role(Role::Superuser, ok_handler).into_boxed_handler();
        let req = Request::builder().path("/users").user(user(Role::Editor)).build();
        let resp = h.call(req).await;
        assert_eq!(resp.status_code(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn sufficient_role_reaches_handler() {
        let h = require_role(Role::Editor, ok_handler).into_boxed_handler();
        let req = Request::builder().user(user(Role::Superuser)).build();
        let resp = h.call(req).await;
        assert_eq!(resp.status_code(), StatusCode::OK);
        assert_eq!(resp.body(), b"inner");
    }

    #[tokio::test]
    async fn disabled_user_never_passes_a_guard() {
        let h = require_login(ok_handler).into_boxed_handler();
        let req = Request::builder().user(user(Role::Disabled)).build();
        assert_eq!(h.call(req).await.status_code(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn local_dev_only_is_empty_elsewhere() {
        let h = local_dev_only(ok_handler).into_boxed_handler();

        let req = Request::builder().local_dev(false).build();
        let resp = h.call(req).await;
        assert_eq!(resp.status_code(), StatusCode::OK);
        assert!(resp.body().is_empty());

        let req = Request::builder().local_dev(true).build();
        assert_eq!(h.call(req).await.body(), b"inner");
    }
}
