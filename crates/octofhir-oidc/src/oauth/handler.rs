//! Authorization endpoint handler chain.
//!
//! Each grant handler inspects the request and either claims it, writing its
//! results into the shared response, or returns `Ok(())` without touching
//! anything. The chain runs every handler in order and finally checks that
//! each requested response type was served by someone.

use std::sync::Arc;

use async_trait::async_trait;

use crate::AuthResult;
use crate::context::RequestContext;
use crate::error::AuthError;
use crate::oauth::request::AuthorizeRequest;
use crate::oauth::response::AuthorizeResponse;

/// A grant handler at the authorization endpoint.
#[async_trait]
pub trait AuthorizeEndpointHandler: Send + Sync {
    /// Handles the request if it is applicable to this handler.
    ///
    /// Returning `Ok(())` without writing to `response` means "not mine".
    /// A handler that does serve a response type must record it with
    /// [`AuthorizeRequest::set_response_type_handled`].
    async fn handle_authorize_endpoint_request(
        &self,
        ctx: &RequestContext,
        request: &mut AuthorizeRequest,
        response: &mut AuthorizeResponse,
    ) -> AuthResult<()>;
}

/// Ordered list of authorization endpoint handlers.
#[derive(Clone, Default)]
pub struct AuthorizeHandlerChain {
    handlers: Vec<Arc<dyn AuthorizeEndpointHandler>>,
}

impl AuthorizeHandlerChain {
    /// Creates an empty chain.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a handler.
    #[must_use]
    pub fn with_handler(mut self, handler: Arc<dyn AuthorizeEndpointHandler>) -> Self {
        self.handlers.push(handler);
        self
    }

    /// Number of handlers in the chain.
    #[must_use]
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Returns `true` if the chain has no handlers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Runs every handler against the request.
    ///
    /// # Errors
    ///
    /// Returns the first handler error unchanged, `InvalidRequest` if no
    /// response type was requested, or `UnsupportedResponseType` if some
    /// requested response type was left unhandled.
    pub async fn handle(
        &self,
        ctx: &RequestContext,
        request: &mut AuthorizeRequest,
        response: &mut AuthorizeResponse,
    ) -> AuthResult<()> {
        if request.response_types.is_empty() {
            return Err(AuthError::invalid_request("response_type is required"));
        }

        for handler in &self.handlers {
            if let Err(e) = handler
                .handle_authorize_endpoint_request(ctx, request, response)
                .await
            {
                if e.is_server_error() {
                    tracing::error!(
                        request_id = %ctx.request_id,
                        category = %e.category(),
                        error = %e,
                        "authorization request failed"
                    );
                } else {
                    tracing::debug!(
                        request_id = %ctx.request_id,
                        category = %e.category(),
                        error = %e,
                        "authorization request rejected"
                    );
                }
                return Err(e);
            }
        }

        if let Some(response_type) = request.unhandled_response_type() {
            tracing::debug!(
                request_id = %ctx.request_id,
                response_type,
                "no handler served response type"
            );
            return Err(AuthError::unsupported_response_type(response_type));
        }

        Ok(())
    }
}
