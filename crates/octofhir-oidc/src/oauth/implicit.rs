//! OAuth 2.0 implicit grant (`response_type=token`).
//!
//! The access token is returned directly in the redirect fragment. The same
//! issuance routine backs the `token` half of the OpenID Connect hybrid
//! response `token id_token`.

use std::sync::Arc;

use async_trait::async_trait;
use time::Duration;

use crate::AuthResult;
use crate::context::RequestContext;
use crate::error::AuthError;
use crate::oauth::handler::AuthorizeEndpointHandler;
use crate::oauth::request::AuthorizeRequest;
use crate::oauth::response::AuthorizeResponse;
use crate::storage::{AccessTokenSession, AccessTokenStorage};
use crate::token::strategy::AccessTokenStrategy;
use crate::types::GrantType;

/// Handles `response_type=token`.
pub struct ImplicitGrantHandler {
    access_token_strategy: Arc<dyn AccessTokenStrategy>,
    access_token_storage: Arc<dyn AccessTokenStorage>,
    access_token_lifetime: Duration,
}

impl ImplicitGrantHandler {
    /// Creates a new handler.
    #[must_use]
    pub fn new(
        access_token_strategy: Arc<dyn AccessTokenStrategy>,
        access_token_storage: Arc<dyn AccessTokenStorage>,
        access_token_lifetime: Duration,
    ) -> Self {
        Self {
            access_token_strategy,
            access_token_storage,
            access_token_lifetime,
        }
    }

    /// Returns the configured access token lifetime.
    #[must_use]
    pub fn access_token_lifetime(&self) -> Duration {
        self.access_token_lifetime
    }

    /// Issues an access token, persists it and writes it to the fragment.
    ///
    /// Callers must have validated the request before calling this; nothing
    /// here checks client permissions. The issued token is also attached to
    /// `request` for the ID token helper.
    ///
    /// # Errors
    ///
    /// Returns `RequestCancelled` if the caller cancelled before the storage
    /// write, `Configuration` if the lifetime overflows the expiry timestamp,
    /// or the strategy/storage error unchanged.
    pub async fn issue_implicit_access_token(
        &self,
        ctx: &RequestContext,
        request: &mut AuthorizeRequest,
        response: &mut AuthorizeResponse,
    ) -> AuthResult<String> {
        let expires_at = request
            .requested_at
            .checked_add(self.access_token_lifetime)
            .ok_or_else(|| AuthError::configuration("access token lifetime overflows expiry"))?;
        let (token, signature) = self.access_token_strategy.generate_access_token()?;

        let record = AccessTokenSession {
            signature: signature.clone(),
            client_id: request.client.client_id.clone(),
            scopes: request.scopes.clone(),
            session: request.session.clone().unwrap_or_default(),
            requested_at: request.requested_at,
            expires_at,
        };

        if ctx.is_cancelled() {
            return Err(AuthError::RequestCancelled);
        }
        self.access_token_storage
            .create_access_token_session(ctx, &signature, &record)
            .await?;

        tracing::debug!(
            request_id = %ctx.request_id,
            client_id = %request.client.client_id,
            "issued implicit access token"
        );

        response.add_fragment("access_token", token.clone());
        response.add_fragment("token_type", "bearer");
        response.add_fragment(
            "expires_in",
            self.access_token_lifetime.whole_seconds().to_string(),
        );
        response.add_fragment("scope", request.scopes.to_string());
        if let Some(state) = &request.state {
            response.add_fragment("state", state.clone());
        }

        request.set_issued_access_token(token.clone());
        Ok(token)
    }
}

#[async_trait]
impl AuthorizeEndpointHandler for ImplicitGrantHandler {
    async fn handle_authorize_endpoint_request(
        &self,
        ctx: &RequestContext,
        request: &mut AuthorizeRequest,
        response: &mut AuthorizeResponse,
    ) -> AuthResult<()> {
        if !request.response_types.exact(&["token"]) {
            return Ok(());
        }

        if !request.client.is_grant_type_allowed(GrantType::Implicit) {
            tracing::warn!(
                request_id = %ctx.request_id,
                client_id = %request.client.client_id,
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
                client_id = %request.client.client_id,
                "client is not allowed to request response type token"
            );
            return Err(AuthError::invalid_grant(
                "The client is not allowed to request response type token",
            ));
        }

        self.issue_implicit_access_token(ctx, request, response)
            .await?;
        request.set_response_type_handled("token");
        Ok(())
    }
}
