//! OpenID Connect session.
//!
//! A [`Session`] is created by the upstream authentication step and attached
//! to the authorization request before the handlers run. The handlers only
//! read it; it is persisted alongside issued access tokens.

use serde::{Deserialize, Serialize};

use crate::token::jwt::{Headers, IdTokenClaims};

/// The authenticated end-user session carried by an authorization request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// ID token claims template. `sub` must be set before an ID token can be
    /// issued.
    pub claims: IdTokenClaims,

    /// Header overrides for the signed ID token.
    #[serde(default)]
    pub headers: Headers,
}

impl Session {
    /// Creates a session for the given subject with no header overrides.
    #[must_use]
    pub fn new(subject: impl Into<String>) -> Self {
        Self {
            claims: IdTokenClaims::for_subject(subject),
            headers: Headers::new(),
        }
    }

    /// Sets the authentication time.
    #[must_use]
    pub fn with_auth_time(mut self, auth_time: time::OffsetDateTime) -> Self {
        self.claims.auth_time = Some(auth_time.unix_timestamp());
        self
    }

    /// Returns the subject, which may be empty.
    #[must_use]
    pub fn subject(&self) -> &str {
        &self.claims.sub
    }
}
