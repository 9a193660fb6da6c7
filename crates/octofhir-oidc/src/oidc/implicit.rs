//! OpenID Connect implicit (`id_token`) and hybrid (`token id_token`) flows.

use std::sync::Arc;

use async_trait::async_trait;

use crate::AuthResult;
use crate::context::RequestContext;
use crate::error::AuthError;
use crate::oauth::handler::AuthorizeEndpointHandler;
use crate::oauth::implicit::ImplicitGrantHandler;
use crate::oauth::request::AuthorizeRequest;
use crate::oauth::response::AuthorizeResponse;
use crate::oidc::helper::IdTokenHelper;
use crate::types::GrantType;

/// Response type sets served by [`OpenIdConnectImplicitHandler`].
const RESPONSE_TYPE_SETS: [&[&str]; 2] = [&["id_token"], &["token", "id_token"]];

/// Handles `response_type=id_token` and `response_type=token id_token` for
/// requests carrying the `openid` scope.
pub struct OpenIdConnectImplicitHandler {
    implicit: Arc<ImplicitGrantHandler>,
    id_token_helper: Arc<IdTokenHelper>,
}

impl OpenIdConnectImplicitHandler {
    /// Creates a new handler. Access tokens are issued through `implicit`.
    #[must_use]
    pub fn new(implicit: Arc<ImplicitGrantHandler>, id_token_helper: Arc<IdTokenHelper>) -> Self {
        Self {
            implicit,
            id_token_helper,
        }
    }

    fn is_applicable(request: &AuthorizeRequest) -> bool {
        request.response_types.matches_exact(&RESPONSE_TYPE_SETS) && request.scopes.has("openid")
    }
}

#[async_trait]
impl AuthorizeEndpointHandler for OpenIdConnectImplicitHandler {
    async fn handle_authorize_endpoint_request(
        &self,
        ctx: &RequestContext,
        request: &mut AuthorizeRequest,
        response: &mut AuthorizeResponse,
    ) -> AuthResult<()> {
        if !Self::is_applicable(request) {
            tracing::debug!(
                request_id = %ctx.request_id,
                response_types = %request.response_types,
                "openid connect implicit handler not applicable"
            );
            return Ok(());
        }

        let client_id = request.client.client_id.clone();

        if !request.client.is_grant_type_allowed(GrantType::Implicit) {
            tracing::warn!(
                request_id = %ctx.request_id,
                client_id = %client_id,
                "client is not allowed to use the implicit grant"
            );
            return Err(AuthError::invalid_grant(
                "The client is not allowed to use the implicit grant type",
            ));
        }

        if !request
            .client
            .are_response_types_allowed(&request.response_types)
        {
            tracing::warn!(
                request_id = %ctx.request_id,
                client_id = %client_id,
                response_types = %request.response_types,
                "client is not allowed to request these response types"
            );
            return Err(AuthError::invalid_grant(format!(
                "The client is not allowed to request response types '{}'",
                request.response_types
            )));
        }

        let Some(session) = request.session.as_ref() else {
            tracing::warn!(
                request_id = %ctx.request_id,
                client_id = %client_id,
                "authorization request carries no session"
            );
            return Err(AuthError::invalid_session(
                "The authorization request carries no session",
            ));
        };

        // Every id token precondition is checked here, before anything is issued.
        let prepared = self
            .id_token_helper
            .prepare(session, &request.client, &request.form)
            .inspect_err(|e| {
                tracing::warn!(
                    request_id = %ctx.request_id,
                    client_id = %client_id,
                    error = %e,
                    "id token preconditions failed"
                );
            })?;

        if request.response_types.has("token") {
            self.implicit
                .issue_implicit_access_token(ctx, request, response)
                .await?;
            request.set_response_type_handled("token");
        }

        let id_token = self
            .id_token_helper
            .sign(prepared, request.issued_access_token())?;

        response.add_fragment("id_token", id_token);
        if let Some(state) = &request.state {
            response.add_fragment("state", state.clone());
        }
        request.set_response_type_handled("id_token");

        tracing::debug!(
            request_id = %ctx.request_id,
            client_id = %client_id,
            "issued id token"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::oidc::session::Session;
    use crate::storage::{AccessTokenStorage, MemoryTokenStore};
    use crate::token::hmac::HmacStrategy;
    use crate::token::jwt::{JwtStrategy, SigningAlgorithm, SigningKeyPair};
    use crate::token::strategy::{AccessTokenStrategy, IdTokenStrategy};
    use crate::types::Client;
    use time::Duration;

    const ISSUER: &str = "https://auth.example.com";

    struct Fixture {
        handler: OpenIdConnectImplicitHandler,
        store: Arc<MemoryTokenStore>,
        hmac: Arc<HmacStrategy>,
        jwt: Arc<JwtStrategy>,
    }

    fn fixture() -> Fixture {
        let hmac = Arc::new(HmacStrategy::new(b"foobarfoobarfoobarfoobarfoobarfoobar".to_vec()).unwrap());
        let jwt = Arc::new(JwtStrategy::new(
            SigningKeyPair::generate_rsa(SigningAlgorithm::RS256).unwrap(),
            ISSUER,
        ));
        let store = Arc::new(MemoryTokenStore::new());
        let implicit = Arc::new(ImplicitGrantHandler::new(
            hmac.clone(),
            store.clone(),
            Duration::hours(1),
        ));
        let helper = Arc::new(IdTokenHelper::new(jwt.clone(), ISSUER, Duration::hours(1)));
        Fixture {
            handler: OpenIdConnectImplicitHandler::new(implicit, helper),
            store,
            hmac,
            jwt,
        }
    }

    fn client() -> Client {
        Client::new("spa")
            .with_grant_types(vec![GrantType::Implicit])
            .with_response_types("token id_token")
    }

    fn request(response_types: &str) -> AuthorizeRequest {
        AuthorizeRequest::new(client())
            .with_response_types(response_types)
            .with_scopes("openid")
            .with_session(Session::new("peter"))
            .with_form_value("nonce", "some-nonce")
    }

    async fn run(
        f: &Fixture,
        request: &mut AuthorizeRequest,
    ) -> (AuthResult<()>, AuthorizeResponse) {
        let mut response = AuthorizeResponse::new();
        let result = f
            .handler
            .handle_authorize_endpoint_request(&RequestContext::new(), request, &mut response)
            .await;
        (result, response)
    }

    #[tokio::test]
    async fn test_not_applicable_without_openid_scope() {
        let f = fixture();
        let mut request = request("id_token").with_scopes("profile");
        let (result, response) = run(&f, &mut request).await;
        result.unwrap();
        assert!(response.fragment().is_empty());
    }

    #[tokio::test]
    async fn test_id_token_only() {
        let f = fixture();
        let mut request = request("id_token").with_state("xyz");
        let (result, response) = run(&f, &mut request).await;
        result.unwrap();

        let fragment = response.fragment();
        assert!(fragment.get("access_token").is_none());
        assert_eq!(fragment.get("state"), Some("xyz"));
        let claims = f.jwt.validate(fragment.get("id_token").unwrap()).unwrap();
        assert!(claims.at_hash.is_none());
        assert!(f.store.is_empty());
        assert_eq!(request.unhandled_response_type(), None);
    }

    #[tokio::test]
    async fn test_hybrid_binds_access_token() {
        let f = fixture();
        let mut request = request("id_token token");
        let (result, response) = run(&f, &mut request).await;
        result.unwrap();

        let fragment = response.fragment();
        let access_token = fragment.get("access_token").unwrap();
        let claims = f.jwt.validate(fragment.get("id_token").unwrap()).unwrap();
        assert_eq!(
            claims.at_hash,
            Some(crate::oidc::helper::access_token_hash(
                SigningAlgorithm::RS256,
                access_token
            ))
        );

        let signature = f.hmac.access_token_signature(access_token).unwrap();
        let record = f.store.get_access_token_session(&signature).await.unwrap();
        assert!(record.is_some());
    }

    #[tokio::test]
    async fn test_nonce_failure_issues_nothing() {
        let f = fixture();
        let mut request = AuthorizeRequest::new(client())
            .with_response_types("token id_token")
            .with_scopes("openid")
            .with_session(Session::new("peter"));
        let (result, response) = run(&f, &mut request).await;

        assert_eq!(result.unwrap_err().kind(), ErrorKind::NonceMissing);
        assert!(response.fragment().is_empty());
        assert!(f.store.is_empty());
    }

    #[tokio::test]
    async fn test_missing_session() {
        let f = fixture();
        let mut request = AuthorizeRequest::new(client())
            .with_response_types("id_token")
            .with_scopes("openid")
            .with_form_value("nonce", "some-nonce");
        let (result, _) = run(&f, &mut request).await;
        assert_eq!(result.unwrap_err().kind(), ErrorKind::InvalidSession);
    }

    #[tokio::test]
    async fn test_unsupported_header_issues_nothing() {
        let f = fixture();
        let mut session = Session::new("peter");
        session.headers.set("crit", "x");
        let mut request = request("token id_token").with_session(session);

        let (result, response) = run(&f, &mut request).await;
        assert_eq!(result.unwrap_err().kind(), ErrorKind::Signing);
        assert!(response.fragment().is_empty());
        assert!(f.store.is_empty());
        assert!(request.issued_access_token().is_none());
    }

    #[tokio::test]
    async fn test_id_token_lifetime_overflow_issues_nothing() {
        let hmac = Arc::new(HmacStrategy::new(b"foobarfoobarfoobarfoobarfoobarfoobar".to_vec()).unwrap());
        let jwt = Arc::new(JwtStrategy::new(
            SigningKeyPair::generate_rsa(SigningAlgorithm::RS256).unwrap(),
            ISSUER,
        ));
        let store = Arc::new(MemoryTokenStore::new());
        let implicit = Arc::new(ImplicitGrantHandler::new(hmac, store.clone(), Duration::hours(1)));
        let helper = Arc::new(IdTokenHelper::new(jwt, ISSUER, Duration::days(365 * 20_000)));
        let handler = OpenIdConnectImplicitHandler::new(implicit, helper);

        let mut request = request("token id_token");
        let mut response = AuthorizeResponse::new();
        let err = handler
            .handle_authorize_endpoint_request(&RequestContext::new(), &mut request, &mut response)
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Configuration);
        assert!(response.fragment().is_empty());
        assert!(store.is_empty());
    }
}
