//! OAuth 2.0 Client domain types.
//!
//! The authorization handlers only ever read a client registration: which
//! grant types it may use and which response types it may request.

use serde::{Deserialize, Serialize};

use crate::types::Arguments;

// =============================================================================
// Grant Type
// =============================================================================

/// OAuth 2.0 grant types.
///
/// Defines the authorization flows a client is allowed to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrantType {
    /// Authorization Code flow.
    AuthorizationCode,
    /// Implicit flow, including the OpenID Connect implicit and hybrid
    /// response types that return tokens from the authorization endpoint.
    Implicit,
    /// Client Credentials flow.
    ClientCredentials,
    /// Refresh Token flow.
    RefreshToken,
}

impl GrantType {
    /// Returns the OAuth 2.0 grant_type parameter value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AuthorizationCode => "authorization_code",
            Self::Implicit => "implicit",
            Self::ClientCredentials => "client_credentials",
            Self::RefreshToken => "refresh_token",
        }
    }
}

impl std::fmt::Display for GrantType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// =============================================================================
// Client
// =============================================================================

/// A registered OAuth 2.0 client, as seen by the authorization handlers.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Client {
    /// Unique client identifier. Used as the ID token audience.
    pub client_id: String,

    /// Grant types this client is allowed to use.
    #[serde(default)]
    pub grant_types: Vec<GrantType>,

    /// Response types this client is allowed to request.
    #[serde(default)]
    pub response_types: Arguments,
}

impl Client {
    /// Creates a client with no grants.
    #[must_use]
    pub fn new(client_id: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            ..Self::default()
        }
    }

    /// Sets the allowed grant types.
    #[must_use]
    pub fn with_grant_types(mut self, grant_types: Vec<GrantType>) -> Self {
        self.grant_types = grant_types;
        self
    }

    /// Sets the allowed response types from a space-delimited value.
    #[must_use]
    pub fn with_response_types(mut self, response_types: &str) -> Self {
        self.response_types = Arguments::parse(response_types);
        self
    }

    /// Checks if the client may use the given grant type.
    #[must_use]
    pub fn is_grant_type_allowed(&self, grant_type: GrantType) -> bool {
        self.grant_types.contains(&grant_type)
    }

    /// Checks if the client may request every one of `requested`.
    #[must_use]
    pub fn are_response_types_allowed(&self, requested: &Arguments) -> bool {
        self.response_types.contains_all(requested)
    }
}
