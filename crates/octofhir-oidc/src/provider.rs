//! Provider composition.
//!
//! [`OidcProvider`] wires the token strategies, the ID token helper and the
//! grant handlers together from an [`OidcConfig`]. This is the only place
//! where concrete algorithms are chosen.

use std::sync::Arc;

use crate::AuthResult;
use crate::config::{OidcConfig, to_time_duration};
use crate::context::RequestContext;
use crate::error::AuthError;
use crate::oauth::handler::AuthorizeHandlerChain;
use crate::oauth::implicit::ImplicitGrantHandler;
use crate::oauth::request::AuthorizeRequest;
use crate::oauth::response::AuthorizeResponse;
use crate::oidc::helper::IdTokenHelper;
use crate::oidc::implicit::OpenIdConnectImplicitHandler;
use crate::storage::AccessTokenStorage;
use crate::token::hmac::HmacStrategy;
use crate::token::jwt::{JwtStrategy, SigningKeyPair};
use crate::token::strategy::{AccessTokenStrategy, IdTokenStrategy};

/// The composed authorization endpoint.
pub struct OidcProvider {
    access_token_strategy: Arc<HmacStrategy>,
    id_token_strategy: Arc<JwtStrategy>,
    chain: AuthorizeHandlerChain,
}

impl OidcProvider {
    /// Builds the provider.
    ///
    /// # Errors
    ///
    /// Returns `Configuration` if the configuration is invalid or
    /// `signing_key` does not use the configured algorithm, and `Token` if the
    /// HMAC secret is rejected.
    pub fn from_config(
        config: &OidcConfig,
        storage: Arc<dyn AccessTokenStorage>,
        signing_key: SigningKeyPair,
    ) -> AuthResult<Self> {
        config
            .validate()
            .map_err(|e| AuthError::configuration(e.to_string()))?;

        let algorithm = config
            .signing_algorithm()
            .map_err(|e| AuthError::configuration(e.to_string()))?;
        if signing_key.algorithm != algorithm {
            return Err(AuthError::configuration(format!(
                "signing key uses {}, configuration requires {}",
                signing_key.algorithm, algorithm
            )));
        }

        let access_token_lifetime =
            to_time_duration("access_token_lifetime", config.access_token_lifetime)
                .map_err(|e| AuthError::configuration(e.to_string()))?;
        let id_token_lifetime = to_time_duration("id_token_lifetime", config.id_token_lifetime)
            .map_err(|e| AuthError::configuration(e.to_string()))?;

        let access_token_strategy = Arc::new(
            HmacStrategy::new(config.hmac.global_secret.as_bytes().to_vec())?
                .with_token_entropy(config.hmac.token_entropy),
        );
        let id_token_strategy = Arc::new(JwtStrategy::new(signing_key, config.issuer.clone()));

        let implicit = Arc::new(ImplicitGrantHandler::new(
            access_token_strategy.clone(),
            storage,
            access_token_lifetime,
        ));
        let helper = Arc::new(IdTokenHelper::new(
            id_token_strategy.clone(),
            config.issuer.clone(),
            id_token_lifetime,
        ));
        let openid = Arc::new(OpenIdConnectImplicitHandler::new(implicit.clone(), helper));

        let chain = AuthorizeHandlerChain::new()
            .with_handler(implicit)
            .with_handler(openid);

        tracing::info!(
            issuer = %config.issuer,
            algorithm = %algorithm,
            kid = %id_token_strategy.current_kid(),
            "authorization endpoint configured"
        );

        Ok(Self {
            access_token_strategy,
            id_token_strategy,
            chain,
        })
    }

    /// Runs the handler chain and returns the assembled response.
    ///
    /// # Errors
    ///
    /// Returns the first handler error, or `UnsupportedResponseType` if no
    /// handler served a requested response type.
    pub async fn authorize(
        &self,
        ctx: &RequestContext,
        request: &mut AuthorizeRequest,
    ) -> AuthResult<AuthorizeResponse> {
        let mut response = AuthorizeResponse::new();
        self.chain.handle(ctx, request, &mut response).await?;
        Ok(response)
    }

    /// The opaque access token strategy.
    #[must_use]
    pub fn access_token_strategy(&self) -> Arc<dyn AccessTokenStrategy> {
        self.access_token_strategy.clone()
    }

    /// The ID token strategy.
    #[must_use]
    pub fn id_token_strategy(&self) -> Arc<dyn IdTokenStrategy> {
        self.id_token_strategy.clone()
    }

    /// The handler chain.
    #[must_use]
    pub fn chain(&self) -> &AuthorizeHandlerChain {
        &self.chain
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HmacConfig;
    use crate::error::ErrorKind;
    use crate::oidc::session::Session;
    use crate::storage::MemoryTokenStore;
    use crate::token::jwt::SigningAlgorithm;
    use crate::types::{Client, GrantType};

    fn config() -> OidcConfig {
        OidcConfig {
            issuer: "https://auth.example.com".to_string(),
            hmac: HmacConfig {
                global_secret: "some-super-cool-secret-that-nobody-knows".to_string(),
                ..HmacConfig::default()
            },
            ..OidcConfig::default()
        }
    }

    fn rs256_key() -> SigningKeyPair {
        SigningKeyPair::generate(SigningAlgorithm::RS256).unwrap()
    }

    #[test]
    fn test_from_config() {
        let provider =
            OidcProvider::from_config(&config(), Arc::new(MemoryTokenStore::new()), rs256_key())
                .unwrap();
        assert_eq!(provider.chain().len(), 2);
        assert_eq!(
            provider.id_token_strategy().algorithm(),
            SigningAlgorithm::RS256
        );
    }

    #[test]
    fn test_key_algorithm_mismatch() {
        let mut config = config();
        config.signing.algorithm = "ES384".to_string();
        let err = OidcProvider::from_config(&config, Arc::new(MemoryTokenStore::new()), rs256_key())
            .err()
            .unwrap();
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let err = OidcProvider::from_config(
            &OidcConfig::default(),
            Arc::new(MemoryTokenStore::new()),
            rs256_key(),
        )
        .err()
        .unwrap();
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }

    #[tokio::test]
    async fn test_authorize_runs_chain() {
        let store = Arc::new(MemoryTokenStore::new());
        let provider = OidcProvider::from_config(&config(), store.clone(), rs256_key()).unwrap();

        let client = Client::new("spa")
            .with_grant_types(vec![GrantType::Implicit])
            .with_response_types("token id_token");
        let mut request = AuthorizeRequest::new(client)
            .with_response_types("token id_token")
            .with_scopes("openid")
            .with_session(Session::new("peter"))
            .with_form_value("nonce", "some-nonce");

        let response = provider
            .authorize(&RequestContext::new(), &mut request)
            .await
            .unwrap();
        assert!(response.fragment().contains("access_token"));
        assert!(response.fragment().contains("id_token"));
        assert_eq!(store.len(), 1);
    }
}
