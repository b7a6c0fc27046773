//! # plinth
//!
//! Request-lifecycle plumbing for JSON APIs behind a reverse proxy.
//!
//! Every JSON service repeats the same glue between the socket and its
//! handlers: who is calling, may they call this, which database connection
//! is theirs, what gets logged, and how domain objects leave as JSON.
//! plinth is that glue, once. nginx still owns TLS, rate limiting, and
//! body-size limits — the proxy does proxy things.
//!
//! What a request flows through:
//!
//! 1. **before** — log method, path, and parameters (secret fields
//!    redacted, output bounded); open the per-request database connection;
//!    resolve the session's user. A stale user id clears the session; a
//!    disabled account is rejected on the spot.
//! 2. **route + guards** — [`auth::require_login`], [`auth::require_role`],
//!    and [`auth::local_dev_only`] wrap handlers; a failed check replies
//!    401 without calling the handler.
//! 3. **after** — error responses are logged with status, method, and URL.
//! 4. **teardown** — always runs: closes the database connection and warns
//!    once about requests slower than a second.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use plinth::{auth, App, Config, Json, Request, Router, Server};
//! use plinth::auth::Role;
//! # struct Db;
//! # #[async_trait::async_trait]
//! # impl plinth::db::Database for Db {
//! #     async fn acquire(&self) -> Result<Arc<dyn plinth::db::Connection>, plinth::db::DbError> { unimplemented!() }
//! #     async fn user_by_id(&self, _: &str) -> Result<Option<plinth::auth::User>, plinth::db::DbError> { unimplemented!() }
//! # }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), plinth::Error> {
//!     let config = Config::from_env();
//!     plinth::logging::init(&config);
//!
//!     let router = Router::new()
//!         .get("/api/me", auth::require_login(whoami))
//!         .get("/api/users", auth::require_role(Role::Superuser, list_users));
//!
//!     let app = App::builder()
//!         .config(config)
//!         .database(Arc::new(Db))
//!         .router(router)
//!         .build();
//!
//!     Server::bind("0.0.0.0:3000")?.serve(app).await
//! }
//!
//! async fn whoami(req: Request) -> Json<serde_json::Value> {
//!     # use plinth::json::ToApi;
//!     let user = req.ctx().user.clone();
//!     Json(user.map(|u| u.to_api()).unwrap_or(serde_json::Value::Null))
//! }
//!
//! async fn list_users(_req: Request) -> Json<serde_json::Value> {
//!     Json(serde_json::json!([]))
//! }
//! ```

mod app;
mod config;
mod context;
mod error;
mod handler;
mod lifecycle;
mod params;
mod request;
mod response;
mod router;
mod server;

pub mod auth;
pub mod db;
pub mod json;
pub mod logging;
pub mod reply;
pub mod session;

pub use app::{App, AppBuilder};
pub use config::Config;
pub use context::Ctx;
pub use error::Error;
pub use handler::Handler;
pub use json::Json;
pub use request::{Request, RequestBuilder};
pub use response::{ContentType, IntoResponse, Response, ResponseBuilder};
pub use router::Router;
pub use server::Server;
