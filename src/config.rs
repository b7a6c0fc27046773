//! Application configuration.
//!
//! One flat struct, read once at startup, owned by the [`App`](crate::App).
//! Handlers see it through the request context rather than through ambient
//! globals.

/// Runtime configuration for the application.
#[derive(Clone, Debug)]
pub struct Config {
    /// Set when running on a developer machine. Gates debug-only endpoints
    /// (see [`auth::local_dev_only`](crate::auth::local_dev_only)) and
    /// replaces the logged client IP with the literal `local`.
    pub is_local_dev: bool,

    /// Set in production deployments. Adds the `PROD ` prefix to every log
    /// line so mixed log streams are unambiguous.
    pub is_production: bool,

    /// Name of the session cookie.
    pub session_cookie: String,
}

impl Config {
    /// Reads configuration from the environment.
    ///
    /// - `PLINTH_ENV` — `local` or `production`; anything else (or unset)
    ///   means a staging-like deployment with neither flag set.
    /// - `PLINTH_SESSION_COOKIE` — overrides the session cookie name.
    pub fn from_env() -> Self {
        let env = std::env::var("PLINTH_ENV").unwrap_or_default();
        Self {
            is_local_dev: env == "local",
            is_production: env == "production",
            session_cookie: std::env::var("PLINTH_SESSION_COOKIE")
                .unwrap_or_else(|_| "sid".to_owned()),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            is_local_dev: false,
            is_production: false,
            session_cookie: "sid".to_owned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_neither_local_nor_production() {
        let c = Config::default();
        assert!(!c.is_local_dev);
        assert!(!c.is_production);
        assert_eq!(c.session_cookie, "sid");
    }
}
