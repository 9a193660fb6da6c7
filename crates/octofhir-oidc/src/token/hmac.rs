//! Keyed-hash opaque tokens.
//!
//! A token is `<key>.<signature>` where `key` is random material and
//! `signature` is `HMAC-SHA256(global_secret, key)`, both base64url without
//! padding. The signature alone identifies the token in storage, so the
//! plaintext token is never persisted.

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use hmac::{Hmac, Mac};
use rand::RngCore;
use rand::rngs::OsRng;
use sha2::Sha256;
use time::OffsetDateTime;

use crate::storage::AccessTokenSession;
use crate::token::strategy::AccessTokenStrategy;

type HmacSha256 = Hmac<Sha256>;

/// Minimum length of the global secret, in bytes.
pub const MIN_SECRET_LENGTH: usize = 32;

/// Default amount of random key material per token, in bytes.
pub const DEFAULT_TOKEN_ENTROPY: usize = 32;

/// Errors produced by the opaque token strategy.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    /// The token is not of the form `<key>.<signature>`.
    #[error("Malformed token: {message}")]
    Malformed {
        /// Description of what is malformed.
        message: String,
    },

    /// The signature does not match the key.
    #[error("Token signature mismatch")]
    InvalidSignature,

    /// The token's record has expired.
    #[error("Token expired")]
    Expired,

    /// The configured secret is too short to sign with.
    #[error("Secret must be at least 32 bytes, got {length}")]
    InsufficientSecret {
        /// Actual secret length.
        length: usize,
    },
}

impl TokenError {
    /// Creates a new `Malformed` error.
    #[must_use]
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::Malformed {
            message: message.into(),
        }
    }
}

/// HMAC-SHA256 token generator and validator.
///
/// Holds only immutable key material and is safe to share across tasks.
#[derive(Clone)]
pub struct HmacStrategy {
    global_secret: Vec<u8>,
    token_entropy: usize,
}

impl std::fmt::Debug for HmacStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HmacStrategy")
            .field("token_entropy", &self.token_entropy)
            .finish_non_exhaustive()
    }
}

impl HmacStrategy {
    /// Creates a strategy from a global secret.
    ///
    /// # Errors
    /// Returns [`TokenError::InsufficientSecret`] if the secret is shorter than
    /// [`MIN_SECRET_LENGTH`].
    pub fn new(global_secret: impl Into<Vec<u8>>) -> Result<Self, TokenError> {
        let global_secret = global_secret.into();
        if global_secret.len() < MIN_SECRET_LENGTH {
            return Err(TokenError::InsufficientSecret {
                length: global_secret.len(),
            });
        }
        Ok(Self {
            global_secret,
            token_entropy: DEFAULT_TOKEN_ENTROPY,
        })
    }

    /// Sets the number of random bytes per token. Values below the default
    /// are raised to it.
    #[must_use]
    pub fn with_token_entropy(mut self, bytes: usize) -> Self {
        self.token_entropy = bytes.max(DEFAULT_TOKEN_ENTROPY);
        self
    }

    /// Generates a fresh token, returning `(token, signature)`.
    ///
    /// # Errors
    /// Returns an error if the MAC cannot be keyed.
    pub fn generate(&self) -> Result<(String, String), TokenError> {
        let mut key = vec![0u8; self.token_entropy];
        OsRng.fill_bytes(&mut key);

        let signature = self.sign(&key)?;
        let encoded_key = URL_SAFE_NO_PAD.encode(&key);
        let encoded_signature = URL_SAFE_NO_PAD.encode(signature);

        Ok((
            format!("{encoded_key}.{encoded_signature}"),
            encoded_signature,
        ))
    }

    /// Validates the structure and signature of `token`.
    ///
    /// # Errors
    /// Returns [`TokenError::Malformed`] or [`TokenError::InvalidSignature`].
    pub fn validate(&self, token: &str) -> Result<(), TokenError> {
        let (key, signature) = split_token(token)?;
        let key = URL_SAFE_NO_PAD
            .decode(key)
            .map_err(|e| TokenError::malformed(format!("key is not base64url: {e}")))?;
        let signature = URL_SAFE_NO_PAD
            .decode(signature)
            .map_err(|e| TokenError::malformed(format!("signature is not base64url: {e}")))?;

        let mut mac = self.mac()?;
        mac.update(&key);
        mac.verify_slice(&signature)
            .map_err(|_| TokenError::InvalidSignature)
    }

    /// Returns the signature part of `token`, without validating it.
    ///
    /// # Errors
    /// Returns [`TokenError::Malformed`] if the token has no signature part.
    pub fn signature<'a>(&self, token: &'a str) -> Result<&'a str, TokenError> {
        split_token(token).map(|(_, signature)| signature)
    }

    fn sign(&self, key: &[u8]) -> Result<Vec<u8>, TokenError> {
        let mut mac = self.mac()?;
        mac.update(key);
        Ok(mac.finalize().into_bytes().to_vec())
    }

    fn mac(&self) -> Result<HmacSha256, TokenError> {
        HmacSha256::new_from_slice(&self.global_secret).map_err(|_| {
            TokenError::InsufficientSecret {
                length: self.global_secret.len(),
            }
        })
    }
}

impl AccessTokenStrategy for HmacStrategy {
    fn generate_access_token(&self) -> Result<(String, String), TokenError> {
        self.generate()
    }

    fn access_token_signature(&self, token: &str) -> Result<String, TokenError> {
        self.signature(token).map(str::to_string)
    }

    fn validate_access_token(
        &self,
        record: &AccessTokenSession,
        token: &str,
    ) -> Result<(), TokenError> {
        if record.expires_at <= OffsetDateTime::now_utc() {
            return Err(TokenError::Expired);
        }
        if self.signature(token)? != record.signature {
            return Err(TokenError::InvalidSignature);
        }
        self.validate(token)
    }
}

fn split_token(token: &str) -> Result<(&str, &str), TokenError> {
    match token.split_once('.') {
        Some((key, signature)) if !key.is_empty() && !signature.is_empty() => {
            Ok((key, signature))
        }
        _ => Err(TokenError::malformed("expected <key>.<signature>")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strategy() -> HmacStrategy {
        HmacStrategy::new(b"some-super-cool-secret-that-nobody-knows".to_vec()).unwrap()
    }

    #[test]
    fn test_short_secret_rejected() {
        let err = HmacStrategy::new(b"too-short".to_vec()).unwrap_err();
        assert_eq!(err, TokenError::InsufficientSecret { length: 9 });
    }

    #[test]
    fn test_generate_and_validate() {
        let strategy = strategy();
        let (token, signature) = strategy.generate().unwrap();

        assert!(token.ends_with(&format!(".{signature}")));
        assert_eq!(strategy.signature(&token).unwrap(), signature);
        strategy.validate(&token).unwrap();
    }

    #[test]
    fn test_tokens_are_unique() {
        let strategy = strategy();
        let (a, sig_a) = strategy.generate().unwrap();
        let (b, sig_b) = strategy.generate().unwrap();
        assert_ne!(a, b);
        assert_ne!(sig_a, sig_b);
    }

    #[test]
    fn test_entropy_floor() {
        let strategy = strategy().with_token_entropy(4);
        let (token, _) = strategy.generate().unwrap();
        let (key, _) = token.split_once('.').unwrap();
        assert_eq!(URL_SAFE_NO_PAD.decode(key).unwrap().len(), DEFAULT_TOKEN_ENTROPY);
    }

    #[test]
    fn test_tampered_token_rejected() {
        let strategy = strategy();
        let (token, _) = strategy.generate().unwrap();
        let (_, signature) = token.split_once('.').unwrap();

        let forged = format!("{}.{}", URL_SAFE_NO_PAD.encode([7u8; 32]), signature);
        assert_eq!(strategy.validate(&forged), Err(TokenError::InvalidSignature));
    }

    #[test]
    fn test_other_secret_rejected() {
        let (token, _) = strategy().generate().unwrap();
        let other = HmacStrategy::new(vec![b'x'; 32]).unwrap();
        assert_eq!(other.validate(&token), Err(TokenError::InvalidSignature));
    }

    #[test]
    fn test_malformed_tokens() {
        let strategy = strategy();
        for token in ["", "no-dot", ".sig", "key.", "!!!.###"] {
            assert!(
                matches!(strategy.validate(token), Err(TokenError::Malformed { .. })),
                "{token:?} should be malformed"
            );
        }
    }

    fn record(signature: &str, lifetime: time::Duration) -> AccessTokenSession {
        let now = OffsetDateTime::now_utc();
        AccessTokenSession {
            signature: signature.to_string(),
            client_id: "spa".to_string(),
            scopes: crate::types::Arguments::parse("openid"),
            session: crate::oidc::session::Session::new("peter"),
            requested_at: now,
            expires_at: now + lifetime,
        }
    }

    #[test]
    fn test_validate_access_token_against_record() {
        let strategy = strategy();
        let (token, signature) = strategy.generate_access_token().unwrap();

        strategy
            .validate_access_token(&record(&signature, time::Duration::hours(1)), &token)
            .unwrap();
        assert_eq!(
            strategy.validate_access_token(&record(&signature, time::Duration::seconds(-1)), &token),
            Err(TokenError::Expired)
        );
    }

    #[test]
    fn test_validate_access_token_wrong_record() {
        let strategy = strategy();
        let (token, _) = strategy.generate_access_token().unwrap();
        let (_, other_signature) = strategy.generate_access_token().unwrap();

        assert_eq!(
            strategy.validate_access_token(&record(&other_signature, time::Duration::hours(1)), &token),
            Err(TokenError::InvalidSignature)
        );
    }
}
