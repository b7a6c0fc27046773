//! JSON error replies.
//!
//! Every error the API returns has the same body shape,
//! `{"err": "<code>: <message>"}`, and is logged before it leaves — nothing
//! is silently swallowed.

use http::StatusCode;
use tracing::{error, warn};

use crate::response::Response;

/// Logs `msg` at error level and returns the JSON error reply.
pub fn error_reply(msg: &str, status: StatusCode) -> Response {
    error!("{msg}");
    json_err(msg, status)
}

/// Logs `msg` at warning level and returns the JSON error reply.
pub fn warn_reply(msg: &str, status: StatusCode) -> Response {
    warn!("{msg}");
    json_err(msg, status)
}

/// The 404 reply for an unmatched route, naming the failing path.
pub(crate) fn not_found(path: &str) -> Response {
    json_err(path, StatusCode::NOT_FOUND)
}

fn json_err(msg: &str, status: StatusCode) -> Response {
    let body = serde_json::json!({ "err": format!("{}: {}", status.as_u16(), msg) });
    Response::builder()
        .status(status)
        .json(serde_json::to_vec(&body).unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn body_shape_is_code_colon_message() {
        let resp = warn_reply("account disabled", StatusCode::BAD_REQUEST);
        assert_eq!(resp.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(resp.body(), br#"{"err":"400: account disabled"}"#);
    }

    #[test]
    fn not_found_names_the_path() {
        let resp = not_found("/nope");
        assert_eq!(resp.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(resp.body(), br#"{"err":"404: /nope"}"#);
    }
}
