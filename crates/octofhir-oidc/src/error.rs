//! Authorization error types.
//!
//! The handlers in this crate surface a small, closed set of error kinds.
//! Precondition failures are returned to the caller untouched; it is the
//! caller's job to translate them into a wire-level OAuth 2.0 error response
//! (see [`AuthError::oauth_error_code`]).

use std::fmt;

use crate::token::hmac::TokenError;
use crate::token::jwt::JwtError;

/// Errors that can occur while handling an authorization request.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// The client is not allowed to use the requested grant or response type.
    #[error("Invalid grant: {message}")]
    InvalidGrant {
        /// Description of why the grant is invalid.
        message: String,
    },

    /// The session is missing or lacks data required for ID token issuance.
    #[error("Invalid session: {message}")]
    InvalidSession {
        /// Description of what is wrong with the session.
        message: String,
    },

    /// The request carries no `nonce` although an ID token must be issued.
    #[error("Nonce missing from authorization request")]
    NonceMissing,

    /// No handler in the chain served one of the requested response types.
    #[error("Unsupported response type: {response_type}")]
    UnsupportedResponseType {
        /// The unhandled response type.
        response_type: String,
    },

    /// The authorization request is malformed.
    #[error("Invalid request: {message}")]
    InvalidRequest {
        /// Description of why the request is invalid.
        message: String,
    },

    /// The request was cancelled before any token was persisted.
    #[error("Request cancelled")]
    RequestCancelled,

    /// The storage collaborator failed.
    #[error("Storage error: {message}")]
    Storage {
        /// Description of the storage error.
        message: String,
    },

    /// The opaque token strategy failed.
    #[error(transparent)]
    Token(#[from] TokenError),

    /// The signed token strategy failed.
    #[error(transparent)]
    Signing(#[from] JwtError),

    /// The configuration is invalid.
    #[error("Configuration error: {message}")]
    Configuration {
        /// Description of the configuration error.
        message: String,
    },
}

impl AuthError {
    /// Creates a new `InvalidGrant` error.
    #[must_use]
    pub fn invalid_grant(message: impl Into<String>) -> Self {
        Self::InvalidGrant {
            message: message.into(),
        }
    }

    /// Creates a new `InvalidSession` error.
    #[must_use]
    pub fn invalid_session(message: impl Into<String>) -> Self {
        Self::InvalidSession {
            message: message.into(),
        }
    }

    /// Creates a new `UnsupportedResponseType` error.
    #[must_use]
    pub fn unsupported_response_type(response_type: impl Into<String>) -> Self {
        Self::UnsupportedResponseType {
            response_type: response_type.into(),
        }
    }

    /// Creates a new `InvalidRequest` error.
    #[must_use]
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest {
            message: message.into(),
        }
    }

    /// Creates a new `Storage` error.
    #[must_use]
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    /// Creates a new `Configuration` error.
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Returns the kind of this error, for comparison without payloads.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidGrant { .. } => ErrorKind::InvalidGrant,
            Self::InvalidSession { .. } => ErrorKind::InvalidSession,
            Self::NonceMissing => ErrorKind::NonceMissing,
            Self::UnsupportedResponseType { .. } => ErrorKind::UnsupportedResponseType,
            Self::InvalidRequest { .. } => ErrorKind::InvalidRequest,
            Self::RequestCancelled => ErrorKind::RequestCancelled,
            Self::Storage { .. } => ErrorKind::Storage,
            Self::Token(_) => ErrorKind::Token,
            Self::Signing(_) => ErrorKind::Signing,
            Self::Configuration { .. } => ErrorKind::Configuration,
        }
    }

    /// Returns `true` if this error was caused by the client's request.
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidGrant { .. }
                | Self::InvalidSession { .. }
                | Self::NonceMissing
                | Self::UnsupportedResponseType { .. }
                | Self::InvalidRequest { .. }
        )
    }

    /// Returns `true` if this is a server-side failure.
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        matches!(
            self,
            Self::Storage { .. } | Self::Token(_) | Self::Signing(_) | Self::Configuration { .. }
        )
    }

    /// Returns the error category for logging purposes.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidGrant { .. } => ErrorCategory::Authorization,
            Self::InvalidSession { .. } => ErrorCategory::Authentication,
            Self::NonceMissing => ErrorCategory::Validation,
            Self::UnsupportedResponseType { .. } => ErrorCategory::Validation,
            Self::InvalidRequest { .. } => ErrorCategory::Validation,
            Self::RequestCancelled => ErrorCategory::Internal,
            Self::Storage { .. } => ErrorCategory::Infrastructure,
            Self::Token(_) | Self::Signing(_) => ErrorCategory::Token,
            Self::Configuration { .. } => ErrorCategory::Configuration,
        }
    }

    /// Returns the OAuth 2.0 error code for this error.
    #[must_use]
    pub fn oauth_error_code(&self) -> &'static str {
        match self {
            Self::InvalidGrant { .. } => "invalid_grant",
            Self::InvalidSession { .. } => "server_error",
            Self::NonceMissing => "invalid_request",
            Self::UnsupportedResponseType { .. } => "unsupported_response_type",
            Self::InvalidRequest { .. } => "invalid_request",
            Self::RequestCancelled => "server_error",
            Self::Storage { .. } => "server_error",
            Self::Token(_) => "server_error",
            Self::Signing(_) => "server_error",
            Self::Configuration { .. } => "server_error",
        }
    }
}

/// Payload-free error kinds, compared by equality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidGrant,
    InvalidSession,
    NonceMissing,
    UnsupportedResponseType,
    InvalidRequest,
    RequestCancelled,
    Storage,
    Token,
    Signing,
    Configuration,
}

/// Categories of authorization errors for logging and monitoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Identity-related errors (session, subject).
    Authentication,
    /// Permission checks against the client registration.
    Authorization,
    /// Token issuance errors.
    Token,
    /// Request validation errors.
    Validation,
    /// Infrastructure/storage errors.
    Infrastructure,
    /// Configuration errors.
    Configuration,
    /// Internal errors.
    Internal,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Authentication => write!(f, "authentication"),
            Self::Authorization => write!(f, "authorization"),
            Self::Token => write!(f, "token"),
            Self::Validation => write!(f, "validation"),
            Self::Infrastructure => write!(f, "infrastructure"),
            Self::Configuration => write!(f, "configuration"),
            Self::Internal => write!(f, "internal"),
        }
    }
}
