//! Authorization responses.
//!
//! Implicit and hybrid flows return their results in the redirect URI
//! fragment, never the query string. Handlers append to the fragment through
//! [`AuthorizeResponse::add_fragment`]; the HTTP layer reads it back when it
//! builds the redirect.

use indexmap::IndexMap;
use url::Url;

/// Fragment parameters, in insertion order. A key is written at most once.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fragment(IndexMap<String, String>);

impl Fragment {
    /// Returns the value for `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Returns `true` if `key` has been written.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Number of parameters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if nothing has been written.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over `(key, value)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Encodes the parameters as `application/x-www-form-urlencoded`.
    #[must_use]
    pub fn encode(&self) -> String {
        url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.iter())
            .finish()
    }
}

/// The response accumulated by the grant handlers.
#[derive(Debug, Clone, Default)]
pub struct AuthorizeResponse {
    fragment: Fragment,
}

impl AuthorizeResponse {
    /// Creates an empty response.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Writes a fragment parameter. Returns `false` and leaves the existing
    /// value untouched if `key` was already written.
    pub fn add_fragment(&mut self, key: impl Into<String>, value: impl Into<String>) -> bool {
        let key = key.into();
        if self.fragment.0.contains_key(&key) {
            return false;
        }
        self.fragment.0.insert(key, value.into());
        true
    }

    /// Returns the fragment parameters.
    #[must_use]
    pub fn fragment(&self) -> &Fragment {
        &self.fragment
    }

    /// Builds the redirect URL with the fragment parameters.
    ///
    /// Any fragment already present on `redirect_uri` is replaced; the query
    /// string is left as registered.
    pub fn to_redirect_url(&self, redirect_uri: &str) -> Result<String, url::ParseError> {
        let mut url = Url::parse(redirect_uri)?;
        url.set_fragment(Some(&self.fragment.encode()));
        Ok(url.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_fragment_never_overwrites() {
        let mut response = AuthorizeResponse::new();
        assert!(response.add_fragment("state", "first"));
        assert!(!response.add_fragment("state", "second"));
        assert_eq!(response.fragment().get("state"), Some("first"));
        assert_eq!(response.fragment().len(), 1);
    }

    #[test]
    fn test_fragment_preserves_order() {
        let mut response = AuthorizeResponse::new();
        response.add_fragment("access_token", "at");
        response.add_fragment("token_type", "bearer");
        response.add_fragment("id_token", "it");

        let keys: Vec<_> = response.fragment().iter().map(|(k, _)| k).collect();
        assert_eq!(keys, ["access_token", "token_type", "id_token"]);
    }

    #[test]
    fn test_missing_key() {
        let response = AuthorizeResponse::new();
        assert!(response.fragment().get("access_token").is_none());
        assert!(response.fragment().is_empty());
    }

    #[test]
    fn test_to_redirect_url_uses_fragment() {
        let mut response = AuthorizeResponse::new();
        response.add_fragment("access_token", "a.b");
        response.add_fragment("scope", "openid profile");
        response.add_fragment("state", "x&y");

        let url = response
            .to_redirect_url("https://app.example.com/callback?tenant=1#old")
            .unwrap();

        assert_eq!(
            url,
            "https://app.example.com/callback?tenant=1#access_token=a.b&scope=openid+profile&state=x%26y"
        );
    }

    #[test]
    fn test_to_redirect_url_invalid_uri() {
        assert!(AuthorizeResponse::new().to_redirect_url("not a url").is_err());
    }
}
