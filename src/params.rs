//! Request parameter capture for the request log.
//!
//! The before hook logs what a request carried: a JSON body when there is
//! one, else the query string, else an urlencoded form body. Secret fields
//! are redacted before the parameters are ever formatted, and the rendered
//! string is bounded so one oversized payload cannot flood the log.

use std::fmt;

use serde_json::{Map, Value};

/// Keys whose values never reach the log.
const SECRET_KEYS: [&str; 3] = ["password", "passwd", "pwd"];

/// Upper bound on the rendered parameter string.
const MAX_LOGGED: usize = 1000;

/// The redacted, log-ready view of a request's parameters.
pub(crate) struct Params(Map<String, Value>);

impl Params {
    /// Captures parameters from the request, in priority order: JSON object
    /// body, query string, urlencoded form body. Returns `None` when the
    /// request carried nothing loggable.
    pub(crate) fn capture(
        content_type: Option<&str>,
        query: Option<&str>,
        body: &[u8],
    ) -> Option<Self> {
        let mut map = json_object(content_type, body)
            .or_else(|| query.filter(|q| !q.is_empty()).map(pairs))
            .or_else(|| form_body(content_type, body))?;

        if map.is_empty() {
            return None;
        }
        for key in SECRET_KEYS {
            if map.contains_key(key) {
                map.insert(key.to_owned(), Value::String("X".to_owned()));
            }
        }
        Some(Self(map))
    }
}

impl fmt::Display for Params {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered =
            serde_json::to_string(&Value::Object(self.0.clone())).unwrap_or_default();
        if rendered.chars().count() > MAX_LOGGED {
            let bounded: String = rendered.chars().take(MAX_LOGGED).collect();
            f.write_str(&bounded)
        } else {
            f.write_str(&rendered)
        }
    }
}

fn json_object(content_type: Option<&str>, body: &[u8]) -> Option<Map<String, Value>> {
    if !content_type.is_some_and(|c| c.contains("application/json")) {
        return None;
    }
    match serde_json::from_slice(body) {
        Ok(Value::Object(map)) => Some(map),
        _ => None,
    }
}

fn form_body(content_type: Option<&str>, body: &[u8]) -> Option<Map<String, Value>> {
    if !content_type.is_some_and(|c| c.contains("application/x-www-form-urlencoded")) {
        return None;
    }
    std::str::from_utf8(body).ok().filter(|s| !s.is_empty()).map(pairs)
}

/// Parses `k=v&k2=v2` pairs with percent-decoding.
fn pairs(query: &str) -> Map<String, Value> {
    query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            let (k, v) = pair.split_once('=').unwrap_or((pair, ""));
            (decode(k), Value::String(decode(v)))
        })
        .collect()
}

fn decode(s: &str) -> String {
    let bytes = s.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'+' => {
                out.push(b' ');
                i += 1;
            }
            b'%' if i + 2 < bytes.len() => {
                let hi = (bytes[i + 1] as char).to_digit(16);
                let lo = (bytes[i + 2] as char).to_digit(16);
                if let (Some(hi), Some(lo)) = (hi, lo) {
                    out.push((hi * 16 + lo) as u8);
                    i += 3;
                } else {
                    out.push(b'%');
                    i += 1;
                }
            }
            b => {
                out.push(b);
                i += 1;
            }
        }
    }
    String::from_utf8_lossy(&out).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_body_wins_over_query() {
        let p = Params::capture(
            Some("application/json"),
            Some("a=query"),
            br#"{"a":"body"}"#,
        )
        .unwrap();
        assert!(p.to_string().contains(r#""a":"body""#));
    }

    #[test]
    fn query_string_is_parsed_and_decoded() {
        let p = Params::capture(None, Some("name=jane+doe&q=a%26b"), b"").unwrap();
        let s = p.to_string();
        assert!(s.contains(r#""name":"jane doe""#), "{s}");
        assert!(s.contains(r#""q":"a&b""#), "{s}");
    }

    #[test]
    fn form_body_is_parsed() {
        let p = Params::capture(
            Some("application/x-www-form-urlencoded"),
            None,
            b"user=alice&x=1",
        )
        .unwrap();
        assert!(p.to_string().contains(r#""user":"alice""#));
    }

    #[test]
    fn secret_keys_are_redacted() {
        for key in ["password", "passwd", "pwd"] {
            let body = format!(r#"{{"user":"alice","{key}":"hunter2"}}"#);
            let p = Params::capture(Some("application/json"), None, body.as_bytes()).unwrap();
            let s = p.to_string();
            assert!(!s.contains("hunter2"), "secret leaked for `{key}`: {s}");
            assert!(s.contains(&format!(r#""{key}":"X""#)), "{s}");
        }
    }

    #[test]
    fn redaction_also_covers_query_params() {
        let p = Params::capture(None, Some("user=alice&pwd=hunter2"), b"").unwrap();
        assert!(!p.to_string().contains("hunter2"));
    }

    #[test]
    fn rendered_string_is_bounded() {
        let long = "x".repeat(5000);
        let body = format!(r#"{{"blob":"{long}"}}"#);
        let p = Params::capture(Some("application/json"), None, body.as_bytes()).unwrap();
        assert!(p.to_string().chars().count() <= 1000);
    }

    #[test]
    fn empty_payload_captures_nothing() {
        assert!(Params::capture(None, None, b"").is_none());
        assert!(Params::capture(None, Some(""), b"").is_none());
        assert!(Params::capture(Some("application/json"), None, b"[1,2]").is_none());
    }
}
