//! Token strategy traits.
//!
//! Handlers depend on these traits only; which algorithm backs them is
//! decided when the provider is composed.

use crate::storage::AccessTokenSession;
use crate::token::hmac::TokenError;
use crate::token::jwt::{Headers, IdTokenClaims, JwtError, SigningAlgorithm};

/// Issues and validates opaque access tokens.
pub trait AccessTokenStrategy: Send + Sync {
    /// Generates a fresh access token, returning `(token, signature)`.
    ///
    /// The token is handed to the client; the signature is the storage key.
    fn generate_access_token(&self) -> Result<(String, String), TokenError>;

    /// Extracts the storage signature from a presented token.
    fn access_token_signature(&self, token: &str) -> Result<String, TokenError>;

    /// Validates a presented token against its stored record.
    fn validate_access_token(
        &self,
        record: &AccessTokenSession,
        token: &str,
    ) -> Result<(), TokenError>;
}

/// Signs and validates ID tokens.
pub trait IdTokenStrategy: Send + Sync {
    /// The signing algorithm, which also selects the `at_hash` digest.
    fn algorithm(&self) -> SigningAlgorithm;

    /// Signs `claims` with `headers` applied on top of the default header.
    fn sign(&self, claims: &IdTokenClaims, headers: &Headers) -> Result<String, JwtError>;

    /// Verifies signature, expiry and structure of `token`.
    fn validate(&self, token: &str) -> Result<IdTokenClaims, JwtError>;
}
