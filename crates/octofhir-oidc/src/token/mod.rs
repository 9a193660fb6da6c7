//! Token strategies.
//!
//! - [`hmac`] - Opaque HMAC-SHA256 access tokens
//! - [`jwt`] - Signed ID tokens (RS256, RS384, ES384)
//! - [`strategy`] - The traits handlers are written against

pub mod hmac;
pub mod jwt;
pub mod strategy;

pub use hmac::{HmacStrategy, TokenError};
pub use jwt::{Headers, IdTokenClaims, JwtError, JwtStrategy, SigningAlgorithm, SigningKeyPair};
pub use strategy::{AccessTokenStrategy, IdTokenStrategy};
