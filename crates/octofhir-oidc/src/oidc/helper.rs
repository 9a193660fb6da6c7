//! ID token assembly.
//!
//! The helper is the single place where the subject, nonce and header
//! override preconditions are checked. [`IdTokenHelper::prepare`] runs them
//! without side effects, so a handler can reject a request before any access
//! token is issued, and [`IdTokenHelper::sign`] finishes the token once the
//! access token (if any) is known.

use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use time::{Duration, OffsetDateTime};

use crate::AuthResult;
use crate::error::AuthError;
use crate::oauth::request::Form;
use crate::oidc::session::Session;
use crate::token::jwt::{Headers, IdTokenClaims, SigningAlgorithm};
use crate::token::strategy::IdTokenStrategy;
use crate::types::Client;

/// An ID token whose preconditions have passed but which is not signed yet.
#[derive(Debug, Clone)]
pub struct PreparedIdToken {
    claims: IdTokenClaims,
    headers: Headers,
}

/// Builds and signs ID tokens.
pub struct IdTokenHelper {
    strategy: Arc<dyn IdTokenStrategy>,
    issuer: String,
    id_token_lifetime: Duration,
}

impl IdTokenHelper {
    #[must_use]
    pub fn new(
        strategy: Arc<dyn IdTokenStrategy>,
        issuer: impl Into<String>,
        id_token_lifetime: Duration,
    ) -> Self {
        Self {
            strategy,
            issuer: issuer.into(),
            id_token_lifetime,
        }
    }

    /// Returns the configured ID token lifetime.
    #[must_use]
    pub fn id_token_lifetime(&self) -> Duration {
        self.id_token_lifetime
    }

    /// Checks the session subject, the request nonce and the session header
    /// overrides, and builds the claims template.
    ///
    /// # Errors
    ///
    /// `InvalidSession` if the session has no subject, `NonceMissing` if the
    /// form has no non-empty `nonce`, `Signing` if a header override cannot
    /// be applied, `Configuration` if the ID token lifetime overflows the
    /// expiry timestamp.
    pub fn prepare(
        &self,
        session: &Session,
        client: &Client,
        form: &Form,
    ) -> AuthResult<PreparedIdToken> {
        if session.subject().is_empty() {
            return Err(AuthError::invalid_session(
                "session does not carry a subject",
            ));
        }

        let nonce = form
            .get("nonce")
            .filter(|n| !n.is_empty())
            .ok_or(AuthError::NonceMissing)?;

        session.headers.validate()?;

        if OffsetDateTime::now_utc()
            .checked_add(self.id_token_lifetime)
            .is_none()
        {
            return Err(AuthError::configuration("id token lifetime overflows expiry"));
        }

        let mut claims = session.claims.clone();
        claims.iss = self.issuer.clone();
        claims.aud = client.client_id.clone();
        claims.nonce = Some(nonce.to_string());
        claims.at_hash = None;

        Ok(PreparedIdToken {
            claims,
            headers: session.headers.clone(),
        })
    }

    /// Stamps `iat`/`exp`, embeds `at_hash` when an access token was issued
    /// alongside, and signs.
    ///
    /// # Errors
    ///
    /// Returns `Configuration` if the lifetime overflows the expiry
    /// timestamp, otherwise the signing strategy error unchanged.
    pub fn sign(
        &self,
        prepared: PreparedIdToken,
        access_token: Option<&str>,
    ) -> AuthResult<String> {
        let PreparedIdToken {
            mut claims,
            headers,
        } = prepared;

        let now = OffsetDateTime::now_utc();
        claims.iat = now.unix_timestamp();
        claims.exp = now
            .checked_add(self.id_token_lifetime)
            .ok_or_else(|| AuthError::configuration("id token lifetime overflows expiry"))?
            .unix_timestamp();
        claims.at_hash =
            access_token.map(|token| access_token_hash(self.strategy.algorithm(), token));

        Ok(self.strategy.sign(&claims, &headers)?)
    }

    /// Prepares and signs in one step.
    ///
    /// # Errors
    ///
    /// See [`IdTokenHelper::prepare`] and [`IdTokenHelper::sign`].
    pub fn issue_id_token(
        &self,
        session: &Session,
        client: &Client,
        form: &Form,
        access_token: Option<&str>,
    ) -> AuthResult<String> {
        let prepared = self.prepare(session, client, form)?;
        self.sign(prepared, access_token)
    }
}

/// Computes `at_hash`: base64url of the left half of the access token digest.
#[must_use]
pub fn access_token_hash(algorithm: SigningAlgorithm, access_token: &str) -> String {
    let digest = algorithm.digest(access_token.as_bytes());
    URL_SAFE_NO_PAD.encode(&digest[..digest.len() / 2])
}
