//! # octofhir-oidc
//!
//! Authorization endpoint handlers for the OAuth 2.0 implicit grant and the
//! OpenID Connect implicit and hybrid flows.
//!
//! This crate provides:
//! - `response_type=token` (plain OAuth 2.0 implicit grant)
//! - `response_type=id_token` and `response_type=token id_token`
//! - ID token assembly with nonce replay and `at_hash` binding
//! - Opaque HMAC access tokens and signed (RS256/RS384/ES384) ID tokens
//! - Fragment-encoded authorization responses
//!
//! ## Overview
//!
//! Requests are parsed, the client is looked up and the user is authenticated
//! before anything in this crate runs. The handlers receive an
//! [`AuthorizeRequest`](oauth::AuthorizeRequest) with a populated
//! [`Session`](oidc::Session), check the client registration, issue tokens and
//! write them into an [`AuthorizeResponse`](oauth::AuthorizeResponse).
//!
//! ## Modules
//!
//! - [`config`] - Token lifetimes, issuer and key configuration
//! - [`context`] - Per-request context and cancellation
//! - [`error`] - The authorization error taxonomy
//! - [`oauth`] - Authorization requests, responses and the handler chain
//! - [`oidc`] - Sessions, the ID token helper and the OpenID Connect handler
//! - [`provider`] - Composition of strategies and handlers
//! - [`storage`] - Storage traits for issued access tokens
//! - [`token`] - Token strategies
//! - [`types`] - Clients and space-delimited argument lists

pub mod config;
pub mod context;
pub mod error;
pub mod oauth;
pub mod oidc;
pub mod provider;
pub mod storage;
pub mod token;
pub mod types;

pub use config::{ConfigError, OidcConfig};
pub use context::RequestContext;
pub use error::{AuthError, ErrorCategory, ErrorKind};
pub use oauth::{
    AuthorizeEndpointHandler, AuthorizeHandlerChain, AuthorizeRequest, AuthorizeResponse, Form,
    ImplicitGrantHandler,
};
pub use oidc::{IdTokenHelper, OpenIdConnectImplicitHandler, Session};
pub use provider::OidcProvider;
pub use storage::{AccessTokenSession, AccessTokenStorage, MemoryTokenStore};
pub use token::{
    AccessTokenStrategy, HmacStrategy, IdTokenStrategy, JwtStrategy, SigningAlgorithm,
    SigningKeyPair,
};
pub use types::{Arguments, Client, GrantType};

/// Type alias for authorization results.
pub type AuthResult<T> = Result<T, AuthError>;

/// Prelude module for convenient imports.
///
/// ```ignore
/// use octofhir_oidc::prelude::*;
/// ```
pub mod prelude {
    pub use crate::AuthResult;
    pub use crate::config::{ConfigError, OidcConfig};
    pub use crate::context::RequestContext;
    pub use crate::error::{AuthError, ErrorCategory, ErrorKind};
    pub use crate::oauth::{
        AuthorizeEndpointHandler, AuthorizeHandlerChain, AuthorizeRequest, AuthorizeResponse,
        Form, ImplicitGrantHandler,
    };
    pub use crate::oidc::{IdTokenHelper, OpenIdConnectImplicitHandler, Session};
    pub use crate::provider::OidcProvider;
    pub use crate::storage::{AccessTokenSession, AccessTokenStorage, MemoryTokenStore};
    pub use crate::token::{
        AccessTokenStrategy, Headers, HmacStrategy, IdTokenClaims, IdTokenStrategy, JwtStrategy,
        SigningAlgorithm, SigningKeyPair,
    };
    pub use crate::types::{Arguments, Client, GrantType};
}
