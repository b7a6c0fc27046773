//! Minimal plinth example — login, guarded routes, and a debug endpoint.
//!
//! Run with:
//!   PLINTH_ENV=local cargo run --example basic
//!
//! Try:
//!   curl -c jar -X POST http://localhost:3000/login \
//!        -H 'content-type: application/json' \
//!        -d '{"userid":"alice","password":"secret"}'
//!   curl -b jar http://localhost:3000/me
//!   curl -b jar http://localhost:3000/admin/users
//!   curl http://localhost:3000/debug/config

use std::sync::Arc;

use async_trait::async_trait;
use http::StatusCode;
use plinth::auth::{self, Role, User};
use plinth::db::{Connection, Database, DbError};
use plinth::json::{rows, ToApi};
use plinth::{App, Config, Json, Request, Response, Router, Server};

// A stand-in database: two fixed users, connections that cost nothing.
struct DemoDb;
struct DemoConn;

#[async_trait]
impl Connection for DemoConn {
    async fn close(&self) {}
}

#[async_trait]
impl Database for DemoDb {
    async fn acquire(&self) -> Result<Arc<dyn Connection>, DbError> {
        Ok(Arc::new(DemoConn))
    }

    async fn user_by_id(&self, id: &str) -> Result<Option<User>, DbError> {
        Ok(known_users().into_iter().find(|u| u.id == id))
    }
}

fn known_users() -> Vec<User> {
    vec![
        User { id: "alice".into(), name: "Alice".into(), role: Role::Superuser },
        User { id: "bob".into(), name: "Bob".into(), role: Role::User },
    ]
}

#[tokio::main]
async fn main() -> Result<(), plinth::Error> {
    let config = Config::from_env();
    plinth::logging::init(&config);

    let router = Router::new()
        .post("/login", login)
        .get("/me", auth::require_login(whoami))
        .get("/admin/users", auth::require_role(Role::Superuser, list_users))
        .get("/debug/config", auth::local_dev_only(debug_config));

    let app = App::builder()
        .config(config)
        .database(Arc::new(DemoDb))
        .router(router)
        .build();

    Server::bind("0.0.0.0:3000")?.serve(app).await
}

// POST /login — accepts any known userid; a real app checks credentials.
// Note the `password` field from the curl line never reaches the log.
async fn login(req: Request) -> Response {
    #[derive(serde::Deserialize)]
    struct LoginInput {
        userid: String,
    }

    match serde_json::from_slice::<LoginInput>(req.body()) {
        Ok(input) => {
            req.ctx().session().set_userid(&input.userid);
            Response::json(br#"{"ok":true}"#.to_vec())
        }
        Err(_) => plinth::reply::warn_reply("bad login payload", StatusCode::BAD_REQUEST),
    }
}

// GET /me
async fn whoami(req: Request) -> Json<serde_json::Value> {
    let user = req.ctx().user.clone();
    Json(user.map(|u| u.to_api()).unwrap_or(serde_json::Value::Null))
}

// GET /admin/users — superuser only.
async fn list_users(_req: Request) -> Json<serde_json::Value> {
    Json(rows(known_users()))
}

// GET /debug/config — only answers on a local dev machine.
async fn debug_config(req: Request) -> Response {
    Response::text(format!("local_dev={}", req.ctx().local_dev()))
}
