//! Trait and types for the cluster's API-key management endpoints.

use serde::Deserialize;

use crate::body::{CreateApiKeyBody, RoleDescriptorsBody};
use crate::error::Result;

/// Identifiers handed back when a key is created.
///
/// All three fields are required; a response missing any of them fails to
/// decode.
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct CreatedApiKey {
    pub id: String,
    pub api_key: String,
    pub encoded: String,
    /// Expiry in epoch milliseconds, when the key has one.
    #[serde(default)]
    pub expiration: Option<u64>,
}

impl std::fmt::Debug for CreatedApiKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CreatedApiKey")
            .field("id", &self.id)
            .field("expiration", &self.expiration)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UpdatedApiKey {
    /// `false` when the cluster found nothing to change.
    pub updated: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct InvalidatedApiKeys {
    #[serde(default)]
    pub invalidated_api_keys: Vec<String>,
    #[serde(default)]
    pub previously_invalidated_api_keys: Vec<String>,
    #[serde(default)]
    pub error_count: u32,
}

/// Key metadata as returned by the lookup endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ApiKeyInfo {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub invalidated: bool,
}

/// Abstraction over the cluster's `_security/api_key` endpoints.
#[async_trait::async_trait]
pub trait SecurityApi: Send + Sync {
    async fn create_api_key(&self, body: &CreateApiKeyBody) -> Result<CreatedApiKey>;

    /// Replaces the role descriptors of key `id`.
    async fn update_api_key(&self, id: &str, body: &RoleDescriptorsBody) -> Result<UpdatedApiKey>;

    async fn invalidate_api_key(&self, id: &str) -> Result<InvalidatedApiKeys>;

    /// Looks a key up by id. `None` when the cluster does not know it.
    async fn get_api_key(&self, id: &str) -> Result<Option<ApiKeyInfo>>;
}
