//! In-memory access token storage backed by a concurrent map.

use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use crate::AuthResult;
use crate::context::RequestContext;
use crate::error::AuthError;
use crate::storage::access_token::{AccessTokenSession, AccessTokenStorage};

/// Process-local [`AccessTokenStorage`].
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    access_tokens: DashMap<String, AccessTokenSession>,
}

impl MemoryTokenStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored access token sessions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.access_tokens.len()
    }

    /// Returns `true` if no access token sessions are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.access_tokens.is_empty()
    }

    /// Drops expired sessions, returning how many were removed.
    pub fn cleanup_expired(&self) -> usize {
        let before = self.access_tokens.len();
        self.access_tokens.retain(|_, s| !s.is_expired());
        before - self.access_tokens.len()
    }
}

#[async_trait]
impl AccessTokenStorage for MemoryTokenStore {
    async fn create_access_token_session(
        &self,
        ctx: &RequestContext,
        signature: &str,
        session: &AccessTokenSession,
    ) -> AuthResult<()> {
        match self.access_tokens.entry(signature.to_string()) {
            Entry::Occupied(_) => {
                tracing::warn!(request_id = %ctx.request_id, "duplicate access token signature");
                Err(AuthError::storage("access token signature already exists"))
            }
            Entry::Vacant(entry) => {
                entry.insert(session.clone());
                Ok(())
            }
        }
    }

    async fn get_access_token_session(
        &self,
        signature: &str,
    ) -> AuthResult<Option<AccessTokenSession>> {
        Ok(self
            .access_tokens
            .get(signature)
            .map(|entry| entry.value().clone()))
    }

    async fn delete_access_token_session(&self, signature: &str) -> AuthResult<()> {
        self.access_tokens.remove(signature);
        Ok(())
    }
}
