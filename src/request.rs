//! Incoming HTTP request type.

use std::collections::HashMap;
use std::net::SocketAddr;

use bytes::Bytes;
use http::header::{HeaderName, HeaderValue};
use http::{HeaderMap, Method};

use crate::auth::{Role, User};
use crate::context::Ctx;

/// An incoming HTTP request plus its request-scoped context.
pub struct Request {
    method: Method,
    path: String,
    query: Option<String>,
    headers: HeaderMap,
    body: Bytes,
    path_params: HashMap<String, String>,
    remote_addr: SocketAddr,
    pub(crate) ctx: Ctx,
}

impl Request {
    pub(crate) fn from_parts(
        parts: http::request::Parts,
        body: Bytes,
        remote_addr: SocketAddr,
    ) -> Self {
        Self {
            method: parts.method,
            path: parts.uri.path().to_owned(),
            query: parts.uri.query().map(str::to_owned),
            headers: parts.headers,
            body,
            path_params: HashMap::new(),
            remote_addr,
            ctx: Ctx::default(),
        }
    }

    /// Builder for constructing requests by hand, mainly in handler tests.
    pub fn builder() -> RequestBuilder {
        RequestBuilder::new()
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Case-insensitive header lookup; non-UTF-8 values read as absent.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Returns a named path parameter.
    ///
    /// For a route `/users/{id}`, `req.param("id")` on `/users/42` returns
    /// `Some("42")`.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.path_params.get(key).map(String::as_str)
    }

    /// Client IP: the reverse proxy's `X-Real-IP` when present, else the
    /// socket address.
    pub fn ip(&self) -> String {
        self.header("x-real-ip")
            .map(str::to_owned)
            .unwrap_or_else(|| self.remote_addr.ip().to_string())
    }

    /// The caller's `User-Agent`, empty when absent.
    pub fn agent(&self) -> &str {
        self.header("user-agent").unwrap_or("")
    }

    /// The request context: user, session, database connection.
    pub fn ctx(&self) -> &Ctx {
        &self.ctx
    }

    /// Path plus query string, for log lines.
    pub(crate) fn url(&self) -> String {
        match &self.query {
            Some(q) => format!("{}?{}", self.path, q),
            None => self.path.clone(),
        }
    }

    pub(crate) fn set_path_params(&mut self, params: HashMap<String, String>) {
        self.path_params = params;
    }
}

// ── RequestBuilder ────────────────────────────────────────────────────────────

/// Hand-built [`Request`]s for tests.
///
/// ```rust
/// use http::Method;
/// use plinth::Request;
///
/// let req = Request::builder()
///     .method(Method::POST)
///     .path("/users")
///     .header("x-real-ip", "10.0.0.9")
///     .body(br#"{"name":"alice"}"#.to_vec())
///     .build();
/// assert_eq!(req.ip(), "10.0.0.9");
/// ```
pub struct RequestBuilder {
    method: Method,
    path: String,
    query: Option<String>,
    headers: HeaderMap,
    body: Vec<u8>,
    remote_addr: SocketAddr,
    ctx: Ctx,
}

impl RequestBuilder {
    fn new() -> Self {
        Self {
            method: Method::GET,
            path: "/".to_owned(),
            query: None,
            headers: HeaderMap::new(),
            body: Vec::new(),
            remote_addr: SocketAddr::from(([127, 0, 0, 1], 0)),
            ctx: Ctx::default(),
        }
    }

    pub fn method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    pub fn path(mut self, path: &str) -> Self {
        self.path = path.to_owned();
        self
    }

    pub fn query(mut self, query: &str) -> Self {
        self.query = Some(query.to_owned());
        self
    }

    /// # Panics
    ///
    /// Panics on an invalid header name or value.
    pub fn header(mut self, name: &str, value: &str) -> Self {
        let name = HeaderName::try_from(name).expect("invalid header name");
        let value = HeaderValue::from_str(value).expect("invalid header value");
        self.headers.insert(name, value);
        self
    }

    pub fn body(mut self, body: Vec<u8>) -> Self {
        self.body = body;
        self
    }

    pub fn remote_addr(mut self, addr: SocketAddr) -> Self {
        self.remote_addr = addr;
        self
    }

    /// Pre-resolves the authenticated user, as the before hook would.
    pub fn user(mut self, user: User) -> Self {
        self.ctx.is_logged = true;
        self.ctx.is_superuser = user.role == Role::Superuser;
        self.ctx.user = Some(user);
        self
    }

    pub fn local_dev(mut self, local_dev: bool) -> Self {
        self.ctx.local_dev = local_dev;
        self
    }

    pub fn build(self) -> Request {
        Request {
            method: self.method,
            path: self.path,
            query: self.query,
            headers: self.headers,
            body: Bytes::from(self.body),
            path_params: HashMap::new(),
            remote_addr: self.remote_addr,
            ctx: self.ctx,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ip_prefers_the_proxy_header() {
        let req = Request::builder().header("x-real-ip", "203.0.113.7").build();
        assert_eq!(req.ip(), "203.0.113.7");

        let req = Request::builder()
            .remote_addr(SocketAddr::from(([192, 168, 1, 5], 4000)))
            .build();
        assert_eq!(req.ip(), "192.168.1.5");
    }

    #[test]
    fn url_includes_the_query_string() {
        let req = Request::builder().path("/search").query("q=x").build();
        assert_eq!(req.url(), "/search?q=x");
    }

    #[test]
    fn header_lookup_is_case_insensitive() {
        let req = Request::builder().header("user-agent", "curl/8").build();
        assert_eq!(req.header("User-Agent"), Some("curl/8"));
        assert_eq!(req.agent(), "curl/8");
    }
}
