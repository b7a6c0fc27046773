//! JSON serialization of domain objects for the REST surface.
//!
//! Three things need special handling on their way out of the API, and each
//! gets an explicit mechanism instead of runtime type inspection:
//!
//! - domain model instances render through their own [`ToApi`] impl;
//! - query result sets materialize into an ordered array via [`rows`];
//! - timestamps render as ISO-8601 strings, or `null` when absent, via
//!   [`Timestamp`].
//!
//! Everything else is plain serde: wrap any `Serialize` value in [`Json`]
//! and return it from a handler.

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use serde_json::Value;

use crate::response::{IntoResponse, Response};

// ── ToApi ────────────────────────────────────────────────────────────────────

/// Capability interface for domain models: the model owns its REST
/// representation.
pub trait ToApi {
    fn to_api(&self) -> Value;
}

impl<T: ToApi + ?Sized> ToApi for &T {
    fn to_api(&self) -> Value {
        (**self).to_api()
    }
}

/// Materializes a query result set into an ordered JSON array.
pub fn rows<T: ToApi>(items: impl IntoIterator<Item = T>) -> Value {
    Value::Array(items.into_iter().map(|item| item.to_api()).collect())
}

// ── Timestamp ────────────────────────────────────────────────────────────────

/// A possibly-absent timestamp that serializes to ISO-8601 or `null`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Timestamp(pub Option<DateTime<Utc>>);

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.0 {
            Some(ts) => serializer.serialize_str(&ts.to_rfc3339()),
            None => serializer.serialize_none(),
        }
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(ts: DateTime<Utc>) -> Self {
        Self(Some(ts))
    }
}

impl From<Option<DateTime<Utc>>> for Timestamp {
    fn from(ts: Option<DateTime<Utc>>) -> Self {
        Self(ts)
    }
}

// ── Json response wrapper ────────────────────────────────────────────────────

/// Typed JSON response: `return Json(value)` from a handler.
pub struct Json<T: Serialize>(pub T);

impl<T: Serialize> IntoResponse for Json<T> {
    fn into_response(self) -> Response {
        match serde_json::to_vec(&self.0) {
            Ok(bytes) => Response::json(bytes),
            Err(e) => crate::reply::error_reply(
                &format!("response serialization failed: {e}"),
                http::StatusCode::INTERNAL_SERVER_ERROR,
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    struct Widget {
        id: u32,
    }

    impl ToApi for Widget {
        fn to_api(&self) -> Value {
            serde_json::json!({"id": self.id})
        }
    }

    #[test]
    fn timestamp_renders_iso8601() {
        let ts = Timestamp::from(Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap());
        assert_eq!(
            serde_json::to_string(&ts).unwrap(),
            r#""2024-05-01T12:30:00+00:00""#
        );
    }

    #[test]
    fn absent_timestamp_renders_null() {
        assert_eq!(serde_json::to_string(&Timestamp(None)).unwrap(), "null");
    }

    #[test]
    fn rows_preserves_order_and_uses_to_api() {
        let set = vec![Widget { id: 3 }, Widget { id: 1 }, Widget { id: 2 }];
        assert_eq!(
            serde_json::to_string(&rows(&set)).unwrap(),
            r#"[{"id":3},{"id":1},{"id":2}]"#
        );
    }

    #[test]
    fn json_wrapper_sets_content_type() {
        let resp = Json(serde_json::json!({"ok": true})).into_response();
        assert_eq!(resp.header("content-type"), Some("application/json"));
        assert_eq!(resp.body(), br#"{"ok":true}"#);
    }
}
