//! The before / after / teardown hooks of one request.
//!
//! `before` runs ahead of routing: it logs the request with redacted
//! parameters, opens the database connection, and resolves the session's
//! user. A `Err(response)` short-circuits the handler but not the rest of
//! the pipeline — `after` and `teardown` run for every request, whatever
//! happened in between.

use std::time::{Duration, Instant};

use http::{Method, StatusCode};
use tracing::{error, info, warn};

use crate::app::App;
use crate::auth::Role;
use crate::context::Ctx;
use crate::params::Params;
use crate::reply;
use crate::request::Request;
use crate::response::Response;

/// Requests slower than this get one warning in the log. Long-running work
/// belongs in a background task, not in a request.
const SLOW_THRESHOLD: Duration = Duration::from_secs(1);

/// The before hook. On `Err` the handler is skipped and the response
/// returned as-is.
pub(crate) async fn before(app: &App, req: &mut Request) -> Result<(), Response> {
    match Params::capture(req.header("content-type"), req.query(), req.body()) {
        Some(params) => info!("{} {} {}", req.method(), req.path(), params),
        None => info!("{} {}", req.method(), req.path()),
    }

    let conn = app
        .db()
        .acquire()
        .await
        .map_err(|e| reply::error_reply(&e.to_string(), StatusCode::INTERNAL_SERVER_ERROR))?;
    req.ctx.db = Some(conn);

    req.ctx.host = req.header("x-real-host").unwrap_or("").to_owned();

    if let Some(uid) = req.ctx.session.userid() {
        match app.db().user_by_id(&uid).await {
            Ok(Some(user)) => req.ctx.user = Some(user),
            // A session pointing at no record is stale or forged either
            // way: drop it so the next request starts clean.
            Ok(None) | Err(_) => {
                req.ctx.session.clear();
                return Err(reply::error_reply("unknown uid", StatusCode::BAD_REQUEST));
            }
        }
    }

    req.ctx.is_logged = req.ctx.user.is_some();
    req.ctx.is_superuser = req.ctx.user.as_ref().is_some_and(|u| u.role == Role::Superuser);

    if req.ctx.user.as_ref().is_some_and(|u| u.role == Role::Disabled) {
        return Err(reply::warn_reply("account disabled", StatusCode::BAD_REQUEST));
    }

    req.ctx.started = Instant::now();
    Ok(())
}

/// The after hook: error responses are logged, with the level picked by
/// status class.
pub(crate) fn after(method: &Method, url: &str, response: &Response) {
    let status = response.status_code().as_u16();
    match response_log(status) {
        Some(LogAs::Error) => error!("  {status} {method} {url}"),
        Some(LogAs::Warn) => warn!("  {status} {method} {url}"),
        None => {}
    }
}

/// The teardown hook. Runs for every request, also when the handler failed
/// or the before hook short-circuited.
pub(crate) async fn teardown(ctx: &Ctx, path: &str) {
    if let Some(conn) = ctx.db.as_ref() {
        conn.close().await;
    }
    if let Some(msg) = slow_message(path, ctx.started.elapsed()) {
        warn!("{msg}");
    }
}

#[derive(Debug, PartialEq, Eq)]
enum LogAs {
    Warn,
    Error,
}

fn response_log(status: u16) -> Option<LogAs> {
    match status {
        400..=599 => Some(LogAs::Error),
        200..=399 => None,
        _ => Some(LogAs::Warn),
    }
}

fn slow_message(path: &str, elapsed: Duration) -> Option<String> {
    (elapsed > SLOW_THRESHOLD)
        .then(|| format!("SLOW! {} time={:.3}", path, elapsed.as_secs_f64()))
}
