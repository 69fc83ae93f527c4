//! Credential strategies for outgoing requests.
//!
//! The client holds at most one [`AuthProvider`] and applies it to every
//! request it issues, so alternative schemes plug in without touching the
//! call sites.

use {
    reqwest::blocking::RequestBuilder,
    secrecy::{ExposeSecret, Secret},
};

/// Produces transport-level credentials for an outgoing request.
pub trait AuthProvider: Send + Sync {
    /// Attach credentials to the request.
    fn apply(&self, request: RequestBuilder) -> RequestBuilder;
}

/// HTTP basic authentication.
pub struct HttpBasicAuth {
    user: String,
    password: Secret<String>,
}

impl HttpBasicAuth {
    #[must_use]
    pub fn new(user: impl Into<String>, password: Secret<String>) -> Self {
        Self {
            user: user.into(),
            password,
        }
    }
}

impl AuthProvider for HttpBasicAuth {
    fn apply(&self, request: RequestBuilder) -> RequestBuilder {
        request.basic_auth(&self.user, Some(self.password.expose_secret()))
    }
}

impl std::fmt::Debug for HttpBasicAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpBasicAuth")
            .field("user", &self.user)
            .field("password", &"[REDACTED]")
            .finish()
    }
}
