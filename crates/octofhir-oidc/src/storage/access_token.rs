//! Access token session storage trait.
//!
//! # Implementation Notes
//!
//! Implementations should:
//!
//! - Store records by signature; the plaintext token is never handed over
//! - Make `create` an atomic "store if absent", failing on a duplicate signature
//! - Treat expired records as absent or clean them up periodically

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::AuthResult;
use crate::context::RequestContext;
use crate::oidc::session::Session;
use crate::types::Arguments;

/// Everything recorded about an issued access token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessTokenSession {
    /// Token signature, the storage key.
    pub signature: String,

    /// Client the token was issued to.
    pub client_id: String,

    /// Scopes requested with the token.
    pub scopes: Arguments,

    /// The end-user session at issuance time.
    pub session: Session,

    /// When the authorization request was received.
    #[serde(with = "time::serde::rfc3339")]
    pub requested_at: OffsetDateTime,

    /// When the token stops being valid.
    #[serde(with = "time::serde::rfc3339")]
    pub expires_at: OffsetDateTime,
}

impl AccessTokenSession {
    /// Returns `true` if this token has expired.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        OffsetDateTime::now_utc() >= self.expires_at
    }
}

/// Storage trait for access token sessions.
#[async_trait]
pub trait AccessTokenStorage: Send + Sync {
    /// Stores a new access token session under `signature`.
    ///
    /// # Errors
    ///
    /// Returns an error if the record cannot be stored, including when a
    /// record with the same signature already exists.
    async fn create_access_token_session(
        &self,
        ctx: &RequestContext,
        signature: &str,
        session: &AccessTokenSession,
    ) -> AuthResult<()>;

    /// Looks up an access token session by signature.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn get_access_token_session(
        &self,
        signature: &str,
    ) -> AuthResult<Option<AccessTokenSession>>;

    /// Removes an access token session. Removing a missing record is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn delete_access_token_session(&self, signature: &str) -> AuthResult<()>;
}
