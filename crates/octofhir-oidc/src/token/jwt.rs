//! Signed ID tokens.
//!
//! ID tokens are JWTs signed with an asymmetric key. RS256, RS384 and ES384
//! are supported; RS256 is the OpenID Connect default.
//!
//! ## Example
//!
//! ```ignore
//! use octofhir_oidc::token::jwt::{JwtStrategy, SigningKeyPair, SigningAlgorithm};
//!
//! let key_pair = SigningKeyPair::generate_rsa(SigningAlgorithm::RS256)?;
//! let strategy = JwtStrategy::new(key_pair, "https://auth.example.com");
//!
//! let token = strategy.sign(&claims, &Headers::new())?;
//! let claims = strategy.validate(&token)?;
//! ```

use std::collections::BTreeMap;
use std::fmt;

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use p384::SecretKey as EcSecretKey;
use p384::ecdsa::SigningKey as EcSigningKey;
use p384::pkcs8::{DecodePrivateKey as EcDecodePrivateKey, EncodePrivateKey as EcEncodePrivateKey};
use rand::rngs::OsRng;
use rsa::RsaPrivateKey;
use rsa::pkcs8::{EncodePublicKey, LineEnding};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256, Sha384};

use crate::token::strategy::IdTokenStrategy;

// ============================================================================
// Error Types
// ============================================================================

/// Errors that can occur during JWT operations.
#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    /// Failed to encode a token.
    #[error("Failed to encode token: {message}")]
    EncodingError {
        /// Description of the encoding error.
        message: String,
    },

    /// The token is structurally invalid.
    #[error("Failed to decode token: {message}")]
    DecodingError {
        /// Description of the decoding error.
        message: String,
    },

    /// The token has expired.
    #[error("Token expired")]
    Expired,

    /// The token signature is invalid.
    #[error("Invalid signature")]
    InvalidSignature,

    /// The token claims are invalid.
    #[error("Invalid claims: {message}")]
    InvalidClaims {
        /// Description of why claims are invalid.
        message: String,
    },

    /// A header override names a field that cannot be set.
    #[error("Unsupported header: {name}")]
    UnsupportedHeader {
        /// Name of the rejected header.
        name: String,
    },

    /// Failed to generate a cryptographic key.
    #[error("Key generation error: {message}")]
    KeyGenerationError {
        /// Description of the key generation error.
        message: String,
    },

    /// Invalid key format or data.
    #[error("Invalid key: {message}")]
    InvalidKey {
        /// Description of why the key is invalid.
        message: String,
    },
}

impl JwtError {
    /// Creates a new `EncodingError`.
    #[must_use]
    pub fn encoding_error(message: impl Into<String>) -> Self {
        Self::EncodingError {
            message: message.into(),
        }
    }

    /// Creates a new `DecodingError`.
    #[must_use]
    pub fn decoding_error(message: impl Into<String>) -> Self {
        Self::DecodingError {
            message: message.into(),
        }
    }

    /// Creates a new `InvalidClaims` error.
    #[must_use]
    pub fn invalid_claims(message: impl Into<String>) -> Self {
        Self::InvalidClaims {
            message: message.into(),
        }
    }

    /// Creates a new `KeyGenerationError`.
    #[must_use]
    pub fn key_generation_error(message: impl Into<String>) -> Self {
        Self::KeyGenerationError {
            message: message.into(),
        }
    }

    /// Creates a new `InvalidKey` error.
    #[must_use]
    pub fn invalid_key(message: impl Into<String>) -> Self {
        Self::InvalidKey {
            message: message.into(),
        }
    }
}

impl From<jsonwebtoken::errors::Error> for JwtError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;

        match err.kind() {
            ErrorKind::ExpiredSignature => Self::Expired,
            ErrorKind::InvalidSignature => Self::InvalidSignature,
            ErrorKind::InvalidAudience
            | ErrorKind::InvalidIssuer
            | ErrorKind::InvalidSubject
            | ErrorKind::ImmatureSignature
            | ErrorKind::MissingRequiredClaim(_) => Self::invalid_claims(err.to_string()),
            ErrorKind::InvalidRsaKey(_)
            | ErrorKind::InvalidEcdsaKey
            | ErrorKind::InvalidKeyFormat => Self::invalid_key(err.to_string()),
            _ => Self::decoding_error(err.to_string()),
        }
    }
}

// ============================================================================
// Signing Algorithm
// ============================================================================

/// Supported signing algorithms for ID tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SigningAlgorithm {
    /// RSA with SHA-256.
    RS256,
    /// RSA with SHA-384.
    RS384,
    /// ECDSA with P-384 curve.
    ES384,
}

impl SigningAlgorithm {
    /// Converts to the `jsonwebtoken` Algorithm type.
    #[must_use]
    pub fn to_jwt_algorithm(self) -> Algorithm {
        match self {
            Self::RS256 => Algorithm::RS256,
            Self::RS384 => Algorithm::RS384,
            Self::ES384 => Algorithm::ES384,
        }
    }

    /// Returns the algorithm name as used in JWT headers.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RS256 => "RS256",
            Self::RS384 => "RS384",
            Self::ES384 => "ES384",
        }
    }

    /// Returns `true` if this is an RSA-based algorithm.
    #[must_use]
    pub fn is_rsa(&self) -> bool {
        matches!(self, Self::RS256 | Self::RS384)
    }

    /// Hashes `input` with the digest paired with this algorithm.
    #[must_use]
    pub fn digest(&self, input: &[u8]) -> Vec<u8> {
        match self {
            Self::RS256 => Sha256::digest(input).to_vec(),
            Self::RS384 | Self::ES384 => Sha384::digest(input).to_vec(),
        }
    }
}

impl fmt::Display for SigningAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for SigningAlgorithm {
    type Err = JwtError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "RS256" => Ok(Self::RS256),
            "RS384" => Ok(Self::RS384),
            "ES384" => Ok(Self::ES384),
            other => Err(JwtError::invalid_key(format!(
                "unsupported signing algorithm {other}"
            ))),
        }
    }
}

// ============================================================================
// Claims and Headers
// ============================================================================

/// ID token claims for OpenID Connect.
///
/// A session carries one of these as a template: the ID token helper fills in
/// `iss`, `aud`, `iat`, `exp`, `nonce` and `at_hash` at issuance time, while
/// `sub`, `auth_time` and any custom claims come from the session.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct IdTokenClaims {
    /// Issuer.
    #[serde(default)]
    pub iss: String,

    /// Subject (end-user identifier).
    #[serde(default)]
    pub sub: String,

    /// Audience (client ID).
    #[serde(default)]
    pub aud: String,

    /// Expiration time (Unix timestamp).
    #[serde(default)]
    pub exp: i64,

    /// Issued at (Unix timestamp).
    #[serde(default)]
    pub iat: i64,

    /// Time the end-user authenticated (Unix timestamp).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_time: Option<i64>,

    /// Nonce from the authorization request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nonce: Option<String>,

    /// Access token hash, present when issued alongside an access token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub at_hash: Option<String>,

    /// Custom claims.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl IdTokenClaims {
    /// Creates a claims template for the given subject.
    #[must_use]
    pub fn for_subject(subject: impl Into<String>) -> Self {
        Self {
            sub: subject.into(),
            ..Self::default()
        }
    }

    /// Adds a custom claim.
    #[must_use]
    pub fn with_claim(mut self, name: impl Into<String>, value: serde_json::Value) -> Self {
        self.extra.insert(name.into(), value);
        self
    }
}

/// Header overrides applied to a signed token.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Headers(BTreeMap<String, String>);

impl Headers {
    /// Header names that may be overridden.
    pub const SUPPORTED: [&'static str; 6] = ["kid", "typ", "cty", "jku", "x5u", "x5t"];

    /// Creates an empty set of overrides.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a header override.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.insert(name.into(), value.into());
    }

    /// Returns a header override.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    /// Checks that every override names a header in [`Headers::SUPPORTED`].
    ///
    /// # Errors
    /// Returns [`JwtError::UnsupportedHeader`] for the first unknown name.
    pub fn validate(&self) -> Result<(), JwtError> {
        match self.0.keys().find(|name| !Self::SUPPORTED.contains(&name.as_str())) {
            Some(name) => Err(JwtError::UnsupportedHeader { name: name.clone() }),
            None => Ok(()),
        }
    }

    fn apply_to(&self, header: &mut Header) -> Result<(), JwtError> {
        self.validate()?;
        for (name, value) in &self.0 {
            let slot = match name.as_str() {
                "kid" => &mut header.kid,
                "typ" => &mut header.typ,
                "cty" => &mut header.cty,
                "jku" => &mut header.jku,
                "x5u" => &mut header.x5u,
                "x5t" => &mut header.x5t,
                _ => {
                    return Err(JwtError::UnsupportedHeader { name: name.clone() });
                }
            };
            *slot = Some(value.clone());
        }
        Ok(())
    }
}

// ============================================================================
// Signing Key Pair
// ============================================================================

/// A signing key pair for ID tokens.
pub struct SigningKeyPair {
    /// Key ID.
    pub kid: String,

    /// Signing algorithm.
    pub algorithm: SigningAlgorithm,

    /// Encoding key (private key) for signing.
    encoding_key: EncodingKey,

    /// Decoding key (public key) for verification.
    decoding_key: DecodingKey,
}

impl fmt::Debug for SigningKeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningKeyPair")
            .field("kid", &self.kid)
            .field("algorithm", &self.algorithm)
            .finish_non_exhaustive()
    }
}

impl SigningKeyPair {
    /// Generates a new key pair for `algorithm`.
    ///
    /// # Errors
    /// Returns an error if key generation fails.
    pub fn generate(algorithm: SigningAlgorithm) -> Result<Self, JwtError> {
        if algorithm.is_rsa() {
            Self::generate_rsa(algorithm)
        } else {
            Self::generate_ec()
        }
    }

    /// Generates a new 2048-bit RSA key pair.
    ///
    /// # Errors
    /// Returns an error if key generation fails or algorithm is not RSA-based.
    pub fn generate_rsa(algorithm: SigningAlgorithm) -> Result<Self, JwtError> {
        if !algorithm.is_rsa() {
            return Err(JwtError::invalid_key(format!(
                "Algorithm {} is not RSA-based",
                algorithm
            )));
        }

        let private_key = RsaPrivateKey::new(&mut OsRng, 2048)
            .map_err(|e| JwtError::key_generation_error(e.to_string()))?;

        let private_pem = private_key
            .to_pkcs8_pem(LineEnding::LF)
            .map_err(|e| JwtError::key_generation_error(e.to_string()))?;
        let public_pem = private_key
            .to_public_key()
            .to_public_key_pem(LineEnding::LF)
            .map_err(|e| JwtError::key_generation_error(e.to_string()))?;

        Self::from_pem(
            uuid::Uuid::new_v4().to_string(),
            algorithm,
            &private_pem,
            &public_pem,
        )
    }

    /// Generates a new EC key pair on the P-384 curve.
    ///
    /// # Errors
    /// Returns an error if key generation fails.
    pub fn generate_ec() -> Result<Self, JwtError> {
        let secret_key = EcSecretKey::random(&mut OsRng);

        let private_pem = secret_key
            .to_pkcs8_pem(LineEnding::LF)
            .map_err(|e| JwtError::key_generation_error(e.to_string()))?;
        let encoding_key = EncodingKey::from_ec_pem(private_pem.as_bytes())
            .map_err(|e| JwtError::key_generation_error(e.to_string()))?;

        let decoding_key = ec_decoding_key(&EcSigningKey::from(&secret_key))?;

        Ok(Self {
            kid: uuid::Uuid::new_v4().to_string(),
            algorithm: SigningAlgorithm::ES384,
            encoding_key,
            decoding_key,
        })
    }

    /// Loads a key pair from PEM strings.
    ///
    /// For ES384 the private key may be PKCS#8 (as written by
    /// [`SigningKeyPair::generate_ec`]) or SEC1; the public key is derived
    /// from it and `public_pem` is ignored.
    ///
    /// # Errors
    /// Returns an error if the PEM data is invalid.
    pub fn from_pem(
        kid: impl Into<String>,
        algorithm: SigningAlgorithm,
        private_pem: &str,
        public_pem: &str,
    ) -> Result<Self, JwtError> {
        let (encoding_key, decoding_key) = if algorithm.is_rsa() {
            (
                EncodingKey::from_rsa_pem(private_pem.as_bytes())
                    .map_err(|e| JwtError::invalid_key(e.to_string()))?,
                DecodingKey::from_rsa_pem(public_pem.as_bytes())
                    .map_err(|e| JwtError::invalid_key(e.to_string()))?,
            )
        } else {
            let secret_key = EcSecretKey::from_pkcs8_pem(private_pem)
                .or_else(|_| EcSecretKey::from_sec1_pem(private_pem))
                .map_err(|e| JwtError::invalid_key(e.to_string()))?;
            let pkcs8 = secret_key
                .to_pkcs8_pem(LineEnding::LF)
                .map_err(|e| JwtError::invalid_key(e.to_string()))?;
            (
                EncodingKey::from_ec_pem(pkcs8.as_bytes())
                    .map_err(|e| JwtError::invalid_key(e.to_string()))?,
                ec_decoding_key(&EcSigningKey::from(&secret_key))?,
            )
        };

        Ok(Self {
            kid: kid.into(),
            algorithm,
            encoding_key,
            decoding_key,
        })
    }
}

fn ec_decoding_key(signing_key: &EcSigningKey) -> Result<DecodingKey, JwtError> {
    let point = signing_key.verifying_key().to_encoded_point(false);
    let x = point
        .x()
        .ok_or_else(|| JwtError::invalid_key("Missing x coordinate"))?;
    let y = point
        .y()
        .ok_or_else(|| JwtError::invalid_key("Missing y coordinate"))?;

    DecodingKey::from_ec_components(
        &URL_SAFE_NO_PAD.encode(x.as_slice()),
        &URL_SAFE_NO_PAD.encode(y.as_slice()),
    )
    .map_err(|e| JwtError::invalid_key(e.to_string()))
}

// ============================================================================
// JWT Strategy
// ============================================================================

/// Signs and validates ID tokens with a single key pair.
///
/// Thread-safe (`Send + Sync`); the key material is never mutated.
#[derive(Debug)]
pub struct JwtStrategy {
    signing_key: SigningKeyPair,
    issuer: String,
}

impl JwtStrategy {
    /// Creates a new strategy.
    ///
    /// # Arguments
    /// * `signing_key` - The key pair to use for signing/verification
    /// * `issuer` - The `iss` value tokens must carry to validate
    #[must_use]
    pub fn new(signing_key: SigningKeyPair, issuer: impl Into<String>) -> Self {
        Self {
            signing_key,
            issuer: issuer.into(),
        }
    }

    /// Returns the current signing key ID.
    #[must_use]
    pub fn current_kid(&self) -> &str {
        &self.signing_key.kid
    }
}

impl IdTokenStrategy for JwtStrategy {
    fn algorithm(&self) -> SigningAlgorithm {
        self.signing_key.algorithm
    }

    fn sign(&self, claims: &IdTokenClaims, headers: &Headers) -> Result<String, JwtError> {
        let mut header = Header::new(self.signing_key.algorithm.to_jwt_algorithm());
        header.kid = Some(self.signing_key.kid.clone());
        headers.apply_to(&mut header)?;

        encode(&header, claims, &self.signing_key.encoding_key)
            .map_err(|e| JwtError::encoding_error(e.to_string()))
    }

    fn validate(&self, token: &str) -> Result<IdTokenClaims, JwtError> {
        let mut validation = Validation::new(self.signing_key.algorithm.to_jwt_algorithm());
        validation.set_issuer(&[&self.issuer]);
        validation.set_required_spec_claims(&["exp", "iat", "sub", "iss"]);
        validation.validate_exp = true;
        validation.validate_aud = false; // Audience checked by the relying party

        decode::<IdTokenClaims>(token, &self.signing_key.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(JwtError::from)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use time::OffsetDateTime;

    const ISSUER: &str = "https://auth.example.com";

    fn claims(lifetime_secs: i64) -> IdTokenClaims {
        let now = OffsetDateTime::now_utc().unix_timestamp();
        IdTokenClaims {
            iss: ISSUER.to_string(),
            aud: "client".to_string(),
            iat: now,
            exp: now + lifetime_secs,
            nonce: Some("n-0S6_WzA2Mj".to_string()),
            ..IdTokenClaims::for_subject("peter")
        }
    }

    fn rs256() -> JwtStrategy {
        JwtStrategy::new(
            SigningKeyPair::generate_rsa(SigningAlgorithm::RS256).unwrap(),
            ISSUER,
        )
    }

    #[test]
    fn test_rs256_sign_validate() {
        let strategy = rs256();
        let token = strategy.sign(&claims(3600), &Headers::new()).unwrap();

        let decoded = strategy.validate(&token).unwrap();
        assert_eq!(decoded.sub, "peter");
        assert_eq!(decoded.nonce.as_deref(), Some("n-0S6_WzA2Mj"));
        assert!(decoded.at_hash.is_none());
    }

    #[test]
    fn test_es384_sign_validate() {
        let strategy = JwtStrategy::new(SigningKeyPair::generate_ec().unwrap(), ISSUER);
        let token = strategy.sign(&claims(3600), &Headers::new()).unwrap();
        assert_eq!(strategy.validate(&token).unwrap().sub, "peter");
    }

    #[test]
    fn test_rsa_signatures_are_deterministic() {
        let strategy = rs256();
        let claims = claims(3600);
        let a = strategy.sign(&claims, &Headers::new()).unwrap();
        let b = strategy.sign(&claims, &Headers::new()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_custom_claims_roundtrip() {
        let strategy = rs256();
        let claims = claims(3600).with_claim("acr", serde_json::json!("urn:loa:2"));
        let token = strategy.sign(&claims, &Headers::new()).unwrap();

        let decoded = strategy.validate(&token).unwrap();
        assert_eq!(decoded.extra.get("acr"), Some(&serde_json::json!("urn:loa:2")));
    }

    #[test]
    fn test_header_overrides() {
        let strategy = rs256();
        let mut headers = Headers::new();
        headers.set("kid", "rotated-key");
        headers.set("typ", "JWT");

        let token = strategy.sign(&claims(3600), &headers).unwrap();
        let header = jsonwebtoken::decode_header(&token).unwrap();
        assert_eq!(header.kid.as_deref(), Some("rotated-key"));
        assert_eq!(header.typ.as_deref(), Some("JWT"));
    }

    #[test]
    fn test_unknown_header_rejected() {
        let strategy = rs256();
        let mut headers = Headers::new();
        headers.set("crit", "exp");

        let err = strategy.sign(&claims(3600), &headers).unwrap_err();
        assert!(matches!(err, JwtError::UnsupportedHeader { name } if name == "crit"));
    }

    #[test]
    fn test_expired_token_rejected() {
        let strategy = rs256();
        let token = strategy.sign(&claims(-3600), &Headers::new()).unwrap();
        assert!(matches!(strategy.validate(&token), Err(JwtError::Expired)));
    }

    #[test]
    fn test_invalid_signature_rejected() {
        let token = rs256().sign(&claims(3600), &Headers::new()).unwrap();
        assert!(matches!(
            rs256().validate(&token),
            Err(JwtError::InvalidSignature)
        ));
    }

    #[test]
    fn test_malformed_token_rejected() {
        let err = rs256().validate("not-a-jwt").unwrap_err();
        assert!(matches!(err, JwtError::DecodingError { .. }));
    }

    #[test]
    fn test_wrong_issuer_rejected() {
        let strategy = rs256();
        let mut claims = claims(3600);
        claims.iss = "https://evil.example.com".to_string();
        let token = strategy.sign(&claims, &Headers::new()).unwrap();
        assert!(matches!(
            strategy.validate(&token),
            Err(JwtError::InvalidClaims { .. })
        ));
    }

    #[test]
    fn test_algorithm_parsing_and_digest() {
        assert_eq!("RS384".parse::<SigningAlgorithm>().unwrap(), SigningAlgorithm::RS384);
        assert!("HS256".parse::<SigningAlgorithm>().is_err());

        assert_eq!(SigningAlgorithm::RS256.digest(b"x").len(), 32);
        assert_eq!(SigningAlgorithm::RS384.digest(b"x").len(), 48);
        assert_eq!(SigningAlgorithm::ES384.digest(b"x").len(), 48);
    }

    #[test]
    fn test_claims_serialization_skips_empty_optionals() {
        let json = serde_json::to_string(&IdTokenClaims::for_subject("peter")).unwrap();
        assert!(json.contains(r#""sub":"peter""#));
        assert!(!json.contains("nonce"));
        assert!(!json.contains("at_hash"));
    }

    #[test]
    fn test_headers_validate() {
        let mut headers = Headers::new();
        headers.set("kid", "k1");
        headers.set("x5t", "thumb");
        headers.validate().unwrap();

        headers.set("alg", "none");
        assert!(matches!(
            headers.validate(),
            Err(JwtError::UnsupportedHeader { name }) if name == "alg"
        ));
    }

    #[test]
    fn test_from_pem_accepts_pkcs8_and_sec1_ec_keys() {
        let secret_key = EcSecretKey::random(&mut OsRng);
        let pkcs8 = secret_key.to_pkcs8_pem(LineEnding::LF).unwrap();
        let sec1 = secret_key.to_sec1_pem(LineEnding::LF).unwrap();

        for private_pem in [pkcs8.as_str(), sec1.as_str()] {
            let key = SigningKeyPair::from_pem("ec-1", SigningAlgorithm::ES384, private_pem, "")
                .unwrap();
            let strategy = JwtStrategy::new(key, ISSUER);
            let token = strategy.sign(&claims(3600), &Headers::new()).unwrap();
            assert_eq!(strategy.validate(&token).unwrap().sub, "peter");
        }
    }
}
