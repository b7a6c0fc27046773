//! End-to-end dispatch pipeline tests: session resolution, guards,
//! connection lifecycle, and error replies. No socket involved — the
//! pipeline is exercised through `App::dispatch` with a counting mock
//! database.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use http::{Method, StatusCode};
use plinth::auth::{self, Role, User};
use plinth::db::{Connection, Database, DbError};
use plinth::{App, Config, Json, Request, Response, Router};

#[derive(Default)]
struct Counters {
    acquired: AtomicUsize,
    closed: AtomicUsize,
}

struct MockDb {
    counters: Arc<Counters>,
}

struct MockConn {
    counters: Arc<Counters>,
}

#[async_trait]
impl Connection for MockConn {
    async fn close(&self) {
        self.counters.closed.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl Database for MockDb {
    async fn acquire(&self) -> Result<Arc<dyn Connection>, DbError> {
        self.counters.acquired.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::new(MockConn { counters: Arc::clone(&self.counters) }))
    }

    async fn user_by_id(&self, id: &str) -> Result<Option<User>, DbError> {
        let user = |name: &str, role| {
            Some(User { id: id.to_owned(), name: name.to_owned(), role })
        };
        Ok(match id {
            "alice" => user("Alice", Role::Superuser),
            "bob" => user("Bob", Role::User),
            "dora" => user("Dora", Role::Disabled),
            _ => None,
        })
    }
}

fn test_app() -> (App, Arc<Counters>) {
    let counters = Arc::new(Counters::default());
    let router = Router::new()
        .post("/login/{id}", login)
        .get("/open", open)
        .get("/me", auth::require_login(whoami))
        .get("/admin", auth::require_role(Role::Superuser, admin))
        .get("/boom", boom);
    let app = App::builder()
        .config(Config::default())
        .database(Arc::new(MockDb { counters: Arc::clone(&counters) }))
        .router(router)
        .build();
    (app, counters)
}

async fn login(req: Request) -> Response {
    let id = req.param("id").unwrap_or("").to_owned();
    req.ctx().session().set_userid(&id);
    Response::json(b"{}".to_vec())
}

async fn open(_req: Request) -> Response {
    Response::text("open")
}

async fn whoami(req: Request) -> Json<serde_json::Value> {
    let id = req.ctx().user.as_ref().map(|u| u.id.clone());
    Json(serde_json::json!({ "id": id }))
}

async fn admin(_req: Request) -> Response {
    Response::text("admin")
}

async fn boom(_req: Request) -> Response {
    Response::status(StatusCode::INTERNAL_SERVER_ERROR)
}

/// Logs `id` in through the real pipeline and returns the `sid=...` cookie
/// pair for follow-up requests.
async fn login_as(app: &App, id: &str) -> String {
    let req = Request::builder()
        .method(Method::POST)
        .path(&format!("/login/{id}"))
        .build();
    let resp = app.dispatch(req).await;
    assert_eq!(resp.status_code(), StatusCode::OK);
    let cookie = resp.header("set-cookie").expect("login must set a cookie");
    cookie.split(';').next().unwrap().to_owned()
}

fn body_text(resp: &Response) -> String {
    String::from_utf8(resp.body().to_vec()).unwrap()
}

#[tokio::test]
async fn guarded_route_rejects_anonymous() {
    let (app, _) = test_app();
    let resp = app.dispatch(Request::builder().path("/me").build()).await;
    assert_eq!(resp.status_code(), StatusCode::UNAUTHORIZED);
    assert!(body_text(&resp).contains("401:"));
}

#[tokio::test]
async fn logged_in_user_reaches_guarded_route() {
    let (app, _) = test_app();
    let cookie = login_as(&app, "bob").await;

    let req = Request::builder().path("/me").header("cookie", &cookie).build();
    let resp = app.dispatch(req).await;
    assert_eq!(resp.status_code(), StatusCode::OK);
    assert!(body_text(&resp).contains("bob"));
}

#[tokio::test]
async fn role_ordering_gates_the_admin_route() {
    let (app, _) = test_app();

    let cookie = login_as(&app, "bob").await;
    let req = Request::builder().path("/admin").header("cookie", &cookie).build();
    assert_eq!(app.dispatch(req).await.status_code(), StatusCode::UNAUTHORIZED);

    let cookie = login_as(&app, "alice").await;
    let req = Request::builder().path("/admin").header("cookie", &cookie).build();
    assert_eq!(app.dispatch(req).await.status_code(), StatusCode::OK);
}

#[tokio::test]
async fn unknown_uid_clears_the_session() {
    let (app, _) = test_app();
    let cookie = login_as(&app, "ghost").await;

    let req = Request::builder().path("/open").header("cookie", &cookie).build();
    let resp = app.dispatch(req).await;
    assert_eq!(resp.status_code(), StatusCode::BAD_REQUEST);
    assert!(body_text(&resp).contains("unknown uid"));

    // The server-side record is gone: the same cookie now behaves as
    // anonymous (401 from the guard, not another 400).
    let req = Request::builder().path("/me").header("cookie", &cookie).build();
    assert_eq!(app.dispatch(req).await.status_code(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn disabled_account_is_rejected_before_any_route() {
    let (app, _) = test_app();
    let cookie = login_as(&app, "dora").await;

    // Even an unguarded route rejects a disabled account.
    let req = Request::builder().path("/open").header("cookie", &cookie).build();
    let resp = app.dispatch(req).await;
    assert_eq!(resp.status_code(), StatusCode::BAD_REQUEST);
    assert!(body_text(&resp).contains("account disabled"));
}

#[tokio::test]
async fn unmatched_route_replies_404_naming_the_path() {
    let (app, _) = test_app();
    let resp = app.dispatch(Request::builder().path("/nope").build()).await;
    assert_eq!(resp.status_code(), StatusCode::NOT_FOUND);
    assert_eq!(resp.body(), br#"{"err":"404: /nope"}"#);
}

#[tokio::test]
async fn handler_error_status_passes_through() {
    let (app, _) = test_app();
    let resp = app.dispatch(Request::builder().path("/boom").build()).await;
    assert_eq!(resp.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn every_connection_is_closed() {
    let (app, counters) = test_app();
    let cookie = login_as(&app, "dora").await;

    // A mix of success, 401, 404, handler error, and before-hook rejection.
    for (path, cookie) in [
        ("/open", None),
        ("/me", None),
        ("/nope", None),
        ("/boom", None),
        ("/open", Some(cookie.as_str())),
    ] {
        let mut builder = Request::builder().path(path);
        if let Some(c) = cookie {
            builder = builder.header("cookie", c);
        }
        app.dispatch(builder.build()).await;
    }

    let acquired = counters.acquired.load(Ordering::SeqCst);
    let closed = counters.closed.load(Ordering::SeqCst);
    assert!(acquired >= 6, "acquired: {acquired}"); // login + 5 requests
    assert_eq!(acquired, closed);
}
