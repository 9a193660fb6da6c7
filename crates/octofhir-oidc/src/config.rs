//! Authorization endpoint configuration.
//!
//! # Example (TOML)
//!
//! ```toml
//! issuer = "https://auth.example.com"
//! access_token_lifetime = "1h"
//! id_token_lifetime = "15m"
//!
//! [signing]
//! algorithm = "ES384"
//!
//! [hmac]
//! global_secret = "a-secret-of-at-least-thirty-two-bytes"
//! token_entropy = 32
//! ```

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::token::hmac::{DEFAULT_TOKEN_ENTROPY, MIN_SECRET_LENGTH};
use crate::token::jwt::SigningAlgorithm;

/// Upper bound for configured token lifetimes (one year).
pub const MAX_TOKEN_LIFETIME: Duration = Duration::from_secs(365 * 24 * 3600);

/// Root configuration for the implicit and hybrid flows.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct OidcConfig {
    /// Issuer URL, used as the ID token `iss` claim.
    pub issuer: String,

    /// Access token lifetime. Also reported as `expires_in`.
    /// Default: 1 hour
    #[serde(with = "humantime_serde")]
    pub access_token_lifetime: Duration,

    /// ID token lifetime.
    /// Default: 1 hour
    #[serde(with = "humantime_serde")]
    pub id_token_lifetime: Duration,

    /// ID token signing.
    pub signing: SigningConfig,

    /// Opaque access token signing.
    pub hmac: HmacConfig,
}

impl Default for OidcConfig {
    fn default() -> Self {
        Self {
            issuer: String::new(),
            access_token_lifetime: Duration::from_secs(3600),
            id_token_lifetime: Duration::from_secs(3600),
            signing: SigningConfig::default(),
            hmac: HmacConfig::default(),
        }
    }
}

/// ID token signing configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SigningConfig {
    /// Signing algorithm: RS256, RS384 or ES384.
    pub algorithm: String,
}

impl Default for SigningConfig {
    fn default() -> Self {
        Self {
            algorithm: "RS256".to_string(),
        }
    }
}

/// Opaque token configuration.
#[derive(Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HmacConfig {
    /// Secret used to sign access tokens. At least 32 bytes.
    pub global_secret: String,

    /// Random bytes per token.
    pub token_entropy: usize,
}

impl Default for HmacConfig {
    fn default() -> Self {
        Self {
            global_secret: String::new(),
            token_entropy: DEFAULT_TOKEN_ENTROPY,
        }
    }
}

impl std::fmt::Debug for HmacConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HmacConfig")
            .field("global_secret", &"<redacted>")
            .field("token_entropy", &self.token_entropy)
            .finish()
    }
}

/// Configuration validation errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// An invalid configuration value was provided.
    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),

    /// A required configuration value is missing.
    #[error("Missing required configuration: {0}")]
    Missing(String),

    /// The configuration document could not be parsed.
    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),
}

impl OidcConfig {
    /// Parses a TOML document and validates it.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Parse` for malformed TOML, otherwise whatever
    /// [`OidcConfig::validate`] reports.
    pub fn from_toml_str(document: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(document)?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Missing` if the issuer or HMAC secret is unset,
    /// and `ConfigError::InvalidValue` if:
    /// - The signing algorithm is not supported
    /// - The HMAC secret is shorter than 32 bytes
    /// - The token entropy is below 32 bytes
    /// - A lifetime is zero or longer than [`MAX_TOKEN_LIFETIME`]
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.issuer.is_empty() {
            return Err(ConfigError::Missing("issuer".to_string()));
        }

        self.signing_algorithm()?;

        if self.hmac.global_secret.is_empty() {
            return Err(ConfigError::Missing("hmac.global_secret".to_string()));
        }
        if self.hmac.global_secret.len() < MIN_SECRET_LENGTH {
            return Err(ConfigError::InvalidValue(format!(
                "hmac.global_secret must be at least {} bytes, got {}",
                MIN_SECRET_LENGTH,
                self.hmac.global_secret.len()
            )));
        }
        if self.hmac.token_entropy < DEFAULT_TOKEN_ENTROPY {
            return Err(ConfigError::InvalidValue(format!(
                "hmac.token_entropy must be at least {}, got {}",
                DEFAULT_TOKEN_ENTROPY, self.hmac.token_entropy
            )));
        }

        for (name, lifetime) in [
            ("access_token_lifetime", self.access_token_lifetime),
            ("id_token_lifetime", self.id_token_lifetime),
        ] {
            if lifetime.is_zero() {
                return Err(ConfigError::InvalidValue(format!("{name} must be > 0")));
            }
            if lifetime > MAX_TOKEN_LIFETIME {
                return Err(ConfigError::InvalidValue(format!(
                    "{name} must not exceed 365 days"
                )));
            }
        }

        Ok(())
    }

    /// Returns the parsed signing algorithm.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` for anything but RS256, RS384 or
    /// ES384.
    pub fn signing_algorithm(&self) -> Result<SigningAlgorithm, ConfigError> {
        self.signing.algorithm.parse().map_err(|_| {
            ConfigError::InvalidValue(format!(
                "Invalid signing algorithm: '{}'. Must be RS256, RS384, or ES384",
                self.signing.algorithm
            ))
        })
    }
}

/// Converts a configured lifetime into the `time` duration the handlers use.
pub(crate) fn to_time_duration(
    name: &str,
    duration: Duration,
) -> Result<time::Duration, ConfigError> {
    time::Duration::try_from(duration)
        .map_err(|_| ConfigError::InvalidValue(format!("{name} is out of range")))
}
