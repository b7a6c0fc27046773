//! Cookie-keyed server-side session storage.
//!
//! The cookie carries only an opaque v4 UUID token; session values live in
//! the store. The lifecycle is: [`SessionStore::load`] in the dispatch
//! pipeline, reads and writes through the cheap-clone [`Session`] handle
//! during the request, [`SessionStore::save`] after the response is built.
//!
//! [`Session::clear`] wipes the values and marks the server-side record for
//! deletion — the next request with the same cookie gets a fresh, empty
//! session.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use uuid::Uuid;

const USERID_KEY: &str = "userid";

// ── Session handle ────────────────────────────────────────────────────────────

/// A handle to one request's session values.
///
/// Clones share the same underlying state, so the dispatch pipeline and the
/// request context can both hold one.
#[derive(Clone)]
pub struct Session {
    token: Option<String>,
    inner: Arc<Mutex<SessionData>>,
}

#[derive(Default)]
struct SessionData {
    values: HashMap<String, String>,
    dirty: bool,
    cleared: bool,
}

impl Session {
    fn new(token: Option<String>, values: HashMap<String, String>) -> Self {
        Self {
            token,
            inner: Arc::new(Mutex::new(SessionData { values, dirty: false, cleared: false })),
        }
    }

    /// A session attached to no store and no request. Used as the context
    /// default and by [`Request::builder`](crate::Request::builder).
    pub fn empty() -> Self {
        Self::new(None, HashMap::new())
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.lock().values.get(key).cloned()
    }

    pub fn set(&self, key: &str, value: &str) {
        let mut data = self.lock();
        data.values.insert(key.to_owned(), value.to_owned());
        data.dirty = true;
        data.cleared = false;
    }

    /// The stored user id, if a login has set one.
    pub fn userid(&self) -> Option<String> {
        self.get(USERID_KEY)
    }

    pub fn set_userid(&self, id: &str) {
        self.set(USERID_KEY, id);
    }

    /// Wipes every value and marks the server-side record for deletion.
    pub fn clear(&self) {
        let mut data = self.lock();
        data.values.clear();
        data.cleared = true;
        data.dirty = false;
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, SessionData> {
        self.inner.lock().expect("session state poisoned")
    }
}

// ── Store ─────────────────────────────────────────────────────────────────────

/// In-memory session store, keyed by the cookie token.
pub struct SessionStore {
    cookie_name: String,
    sessions: Mutex<HashMap<String, HashMap<String, String>>>,
}

impl SessionStore {
    pub fn new(cookie_name: impl Into<String>) -> Self {
        Self { cookie_name: cookie_name.into(), sessions: Mutex::new(HashMap::new()) }
    }

    /// Resolves the session for a request's `Cookie` header.
    ///
    /// A missing or unknown token yields a fresh session with no token;
    /// [`save`](Self::save) mints the token once there is something to keep.
    pub fn load(&self, cookie_header: Option<&str>) -> Session {
        let token = cookie_header.and_then(|h| cookie_value(h, &self.cookie_name));
        if let Some(token) = token {
            if let Some(values) = self.store().get(&token).cloned() {
                return Session::new(Some(token), values);
            }
        }
        Session::empty()
    }

    /// Persists a dirty session and returns the `Set-Cookie` value the
    /// response needs, if any: a fresh token cookie after the first write,
    /// or an expiry cookie after [`Session::clear`].
    pub fn save(&self, session: &Session) -> Option<String> {
        let mut data = session.inner.lock().expect("session state poisoned");

        if data.cleared {
            data.cleared = false;
            let token = session.token.as_ref()?;
            self.store().remove(token);
            return Some(format!("{}=; Path=/; HttpOnly; Max-Age=0", self.cookie_name));
        }

        if !data.dirty {
            return None;
        }
        data.dirty = false;

        match &session.token {
            Some(token) => {
                self.store().insert(token.clone(), data.values.clone());
                None
            }
            None => {
                let token = Uuid::new_v4().to_string();
                self.store().insert(token.clone(), data.values.clone());
                Some(format!("{}={}; Path=/; HttpOnly", self.cookie_name, token))
            }
        }
    }

    fn store(&self) -> std::sync::MutexGuard<'_, HashMap<String, HashMap<String, String>>> {
        self.sessions.lock().expect("session store poisoned")
    }
}

/// Extracts one cookie's value from a `Cookie` header.
fn cookie_value(header: &str, name: &str) -> Option<String> {
    header.split(';').find_map(|pair| {
        let (k, v) = pair.trim().split_once('=')?;
        (k == name).then(|| v.to_owned())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_write_mints_a_token() {
        let store = SessionStore::new("sid");
        let session = store.load(None);
        assert!(session.userid().is_none());

        session.set_userid("u1");
        let cookie = store.save(&session).expect("fresh session needs a cookie");
        assert!(cookie.starts_with("sid="), "cookie: {cookie}");

        let token = cookie.strip_prefix("sid=").unwrap().split(';').next().unwrap();
        let reloaded = store.load(Some(&format!("sid={token}")));
        assert_eq!(reloaded.userid().as_deref(), Some("u1"));
    }

    #[test]
    fn rewrite_of_known_session_needs_no_cookie() {
        let store = SessionStore::new("sid");
        let session = store.load(None);
        session.set_userid("u1");
        let cookie = store.save(&session).unwrap();
        let token = cookie.strip_prefix("sid=").unwrap().split(';').next().unwrap();

        let session = store.load(Some(&format!("sid={token}")));
        session.set("theme", "dark");
        assert!(store.save(&session).is_none());
    }

    #[test]
    fn clear_deletes_the_record_and_expires_the_cookie() {
        let store = SessionStore::new("sid");
        let session = store.load(None);
        session.set_userid("u1");
        let cookie = store.save(&session).unwrap();
        let token = cookie.strip_prefix("sid=").unwrap().split(';').next().unwrap();
        let header = format!("sid={token}");

        let session = store.load(Some(&header));
        session.clear();
        let expiry = store.save(&session).expect("clear must expire the cookie");
        assert!(expiry.contains("Max-Age=0"), "cookie: {expiry}");

        // The old token now resolves to a fresh, empty session.
        assert!(store.load(Some(&header)).userid().is_none());
    }

    #[test]
    fn unknown_token_yields_fresh_session() {
        let store = SessionStore::new("sid");
        let session = store.load(Some("sid=not-a-known-token"));
        assert!(session.userid().is_none());
    }

    #[test]
    fn cookie_header_parsing_handles_many_pairs() {
        assert_eq!(cookie_value("a=1; sid=tok; b=2", "sid").as_deref(), Some("tok"));
        assert_eq!(cookie_value("a=1", "sid"), None);
    }
}
