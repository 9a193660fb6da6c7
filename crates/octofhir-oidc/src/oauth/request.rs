//! Parsed authorization requests.
//!
//! Request parsing (query string, client lookup, redirect URI checks) happens
//! before the handlers run. What reaches them is an [`AuthorizeRequest`]
//! carrying the registered client, the requested response types and scopes,
//! the authenticated session, and the raw form values.

use time::OffsetDateTime;
use uuid::Uuid;

use crate::oidc::session::Session;
use crate::types::{Arguments, Client};

/// Raw request parameters, in arrival order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Form(Vec<(String, String)>);

impl Form {
    /// Creates an empty form.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses an `application/x-www-form-urlencoded` string.
    #[must_use]
    pub fn parse(encoded: &str) -> Self {
        Self(
            url::form_urlencoded::parse(encoded.as_bytes())
                .into_owned()
                .collect(),
        )
    }

    /// Appends a value.
    pub fn add(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.push((key.into(), value.into()));
    }

    /// Returns the first value for `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// An authorization request as seen by the grant handlers.
#[derive(Debug, Clone)]
pub struct AuthorizeRequest {
    /// Request identifier.
    pub id: Uuid,

    /// When the request was received.
    pub requested_at: OffsetDateTime,

    /// The registered client making the request.
    pub client: Client,

    /// Requested response types (`response_type`).
    pub response_types: Arguments,

    /// Requested scopes (`scope`).
    pub scopes: Arguments,

    /// Opaque client state, echoed back in the response.
    pub state: Option<String>,

    /// Authenticated session, attached by the login step.
    pub session: Option<Session>,

    /// Raw request parameters.
    pub form: Form,

    handled_response_types: Arguments,
    issued_access_token: Option<String>,
}

impl AuthorizeRequest {
    /// Creates a request for `client` with nothing requested yet.
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self {
            id: Uuid::new_v4(),
            requested_at: OffsetDateTime::now_utc(),
            client,
            response_types: Arguments::new(),
            scopes: Arguments::new(),
            state: None,
            session: None,
            form: Form::new(),
            handled_response_types: Arguments::new(),
            issued_access_token: None,
        }
    }

    /// Builds a request from the raw form, reading `response_type`, `scope`
    /// and `state` from it.
    #[must_use]
    pub fn from_form(client: Client, form: Form) -> Self {
        let mut request = Self::new(client);
        request.response_types = Arguments::parse(form.get("response_type").unwrap_or_default());
        request.scopes = Arguments::parse(form.get("scope").unwrap_or_default());
        request.state = form
            .get("state")
            .filter(|s| !s.is_empty())
            .map(str::to_string);
        request.form = form;
        request
    }

    /// Sets the requested response types from a space-delimited value.
    #[must_use]
    pub fn with_response_types(mut self, response_types: &str) -> Self {
        self.response_types = Arguments::parse(response_types);
        self
    }

    /// Sets the requested scopes from a space-delimited value.
    #[must_use]
    pub fn with_scopes(mut self, scopes: &str) -> Self {
        self.scopes = Arguments::parse(scopes);
        self
    }

    /// Sets the client state.
    #[must_use]
    pub fn with_state(mut self, state: impl Into<String>) -> Self {
        self.state = Some(state.into());
        self
    }

    /// Attaches the authenticated session.
    #[must_use]
    pub fn with_session(mut self, session: Session) -> Self {
        self.session = Some(session);
        self
    }

    /// Adds a raw form value.
    #[must_use]
    pub fn with_form_value(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.form.add(key, value);
        self
    }

    /// Records that a handler served `response_type`.
    pub fn set_response_type_handled(&mut self, response_type: &str) {
        self.handled_response_types.push(response_type);
    }

    /// Returns the first requested response type no handler served.
    #[must_use]
    pub fn unhandled_response_type(&self) -> Option<&str> {
        self.response_types
            .iter()
            .find(|rt| !self.handled_response_types.has(rt))
    }

    /// Attaches the access token issued for this request, for reuse when the
    /// ID token is assembled.
    pub(crate) fn set_issued_access_token(&mut self, token: String) {
        self.issued_access_token = Some(token);
    }

    /// The access token issued for this request, if any.
    #[must_use]
    pub fn issued_access_token(&self) -> Option<&str> {
        self.issued_access_token.as_deref()
    }
}
