//! The application context and the dispatch pipeline.
//!
//! [`App`] replaces ambient globals: configuration, the database
//! collaborator, the session store, and the router live here, and every
//! request flows through [`App::dispatch`]. The pipeline is plain code —
//! callable from tests without a socket — and [`Server`](crate::Server) is
//! only the hyper glue around it.

use std::sync::Arc;

use tracing::Instrument;

use crate::config::Config;
use crate::db::Database;
use crate::handler::AnyHandler;
use crate::lifecycle;
use crate::logging;
use crate::reply;
use crate::request::Request;
use crate::response::Response;
use crate::router::Router;
use crate::session::{Session, SessionStore};

/// The application context: configuration, collaborators, routes.
pub struct App {
    config: Config,
    db: Arc<dyn Database>,
    sessions: SessionStore,
    router: Router,
}

impl App {
    pub fn builder() -> AppBuilder {
        AppBuilder { config: Config::default(), db: None, router: Router::new() }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub(crate) fn db(&self) -> &dyn Database {
        self.db.as_ref()
    }

    /// Runs one request through the full lifecycle: session resolution,
    /// request span, before hook, routing, after hook, teardown, session
    /// save.
    pub async fn dispatch(&self, mut req: Request) -> Response {
        let session = self.sessions.load(req.header("cookie"));
        req.ctx.session = session.clone();
        req.ctx.local_dev = self.config.is_local_dev;

        let uid = session.userid().unwrap_or_else(|| "anon".to_owned());
        let ip = if self.config.is_local_dev { "local".to_owned() } else { req.ip() };
        let span = logging::request_span(&ip, &uid);

        self.run(req, &session).instrument(span).await
    }

    async fn run(&self, mut req: Request, session: &Session) -> Response {
        let outcome = lifecycle::before(self, &mut req).await;

        // Kept across the handler call: the handler consumes the request,
        // but teardown still needs the connection and the timer.
        let ctx = req.ctx().clone();
        let method = req.method().clone();
        let path = req.path().to_owned();
        let url = req.url();

        let mut response = match outcome {
            Err(short) => short,
            Ok(()) => match self.router.lookup(&method, &path) {
                Some((handler, params)) => {
                    req.set_path_params(params);
                    handler.call(req).await
                }
                None => reply::not_found(&path),
            },
        };

        lifecycle::after(&method, &url, &response);
        lifecycle::teardown(&ctx, &path).await;

        if let Some(cookie) = self.sessions.save(session) {
            response.append_header("set-cookie", &cookie);
        }
        response
    }
}

/// Builder for [`App`]. The database collaborator is the one mandatory
/// piece.
pub struct AppBuilder {
    config: Config,
    db: Option<Arc<dyn Database>>,
    router: Router,
}

impl AppBuilder {
    pub fn config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    pub fn database(mut self, db: Arc<dyn Database>) -> Self {
        self.db = Some(db);
        self
    }

    pub fn router(mut self, router: Router) -> Self {
        self.router = router;
        self
    }

    /// # Panics
    ///
    /// Panics when no database collaborator was provided — a startup-time
    /// programming error, not a runtime condition.
    pub fn build(self) -> App {
        let sessions = SessionStore::new(self.config.session_cookie.clone());
        App {
            config: self.config,
            db: self.db.expect("App requires a Database collaborator"),
            sessions,
            router: self.router,
        }
    }
}
