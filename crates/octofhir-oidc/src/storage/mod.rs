//! Storage interface for issued access tokens.
//!
//! The authorization handlers persist every access token they issue as an
//! [`AccessTokenSession`] keyed by the token's signature. Persistence itself
//! is an external concern; [`MemoryTokenStore`] is provided for tests and
//! single-node deployments.

pub mod access_token;
pub mod memory;

pub use access_token::{AccessTokenSession, AccessTokenStorage};
pub use memory::MemoryTokenStore;
