use async_trait::async_trait;
use reqwest::{Method, Response, StatusCode, Url};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::body::{self, CreateApiKeyBody, RoleDescriptorsBody};
use crate::error::{Error, Result};
use crate::services::security_api::{
    ApiKeyInfo, CreatedApiKey, InvalidatedApiKeys, SecurityApi, UpdatedApiKey,
};
use crate::transport::{HttpClient, send_json};

const CREATING: &str = "creating API key";
const UPDATING: &str = "updating API key";
const INVALIDATING: &str = "invalidating API key";
const FETCHING: &str = "fetching API key";

#[derive(Deserialize)]
struct GetApiKeysResponse {
    #[serde(default)]
    api_keys: Vec<ApiKeyInfo>,
}

/// [`SecurityApi`] over HTTP against an Elasticsearch node.
///
/// Authentication, TLS and timeouts are the business of the injected
/// [`HttpClient`]; this type only knows paths and payloads.
pub struct EsSecurityClient<C> {
    base_url: Url,
    http: C,
}

impl<C: HttpClient> EsSecurityClient<C> {
    pub fn new(base_url: Url, http: C) -> Self {
        Self { base_url, http }
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| Error::input(format!("'{}' cannot be used as a base URL", self.base_url)))?
            .pop_if_empty()
            .extend(["_security", "api_key"])
            .extend(segments);
        Ok(url)
    }

    async fn call<B, T>(
        &self,
        action: &'static str,
        method: Method,
        url: Url,
        body: Option<&B>,
    ) -> Result<T>
    where
        B: serde::Serialize + Sync + ?Sized,
        T: DeserializeOwned,
    {
        let response = send_json(&self.http, action, method, url, body).await?;
        decode(action, ensure_success(action, response).await?).await
    }
}

async fn ensure_success(action: &'static str, response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(Error::Api {
        status,
        action,
        body,
    })
}

async fn decode<T: DeserializeOwned>(action: &'static str, response: Response) -> Result<T> {
    let status = response.status();
    let text = response
        .text()
        .await
        .map_err(|source| Error::Transport { action, source })?;
    debug!(%status, action, bytes = text.len(), "Response received");
    serde_json::from_str(&text).map_err(|e| Error::decode(action, e.to_string()))
}

#[async_trait]
impl<C: HttpClient> SecurityApi for EsSecurityClient<C> {
    async fn create_api_key(&self, body: &CreateApiKeyBody) -> Result<CreatedApiKey> {
        let url = self.endpoint(&[])?;
        self.call(CREATING, Method::PUT, url, Some(body)).await
    }

    async fn update_api_key(&self, id: &str, body: &RoleDescriptorsBody) -> Result<UpdatedApiKey> {
        let url = self.endpoint(&[id])?;
        self.call(UPDATING, Method::PUT, url, Some(body)).await
    }

    async fn invalidate_api_key(&self, id: &str) -> Result<InvalidatedApiKeys> {
        let url = self.endpoint(&[])?;
        let body = body::invalidate_body(id);
        self.call(INVALIDATING, Method::DELETE, url, Some(&body)).await
    }

    async fn get_api_key(&self, id: &str) -> Result<Option<ApiKeyInfo>> {
        let mut url = self.endpoint(&[])?;
        url.query_pairs_mut().append_pair("id", id);

        let response = send_json::<_, ()>(&self.http, FETCHING, Method::GET, url, None).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let found: GetApiKeysResponse =
            decode(FETCHING, ensure_success(FETCHING, response).await?).await?;
        Ok(found.api_keys.into_iter().find(|key| key.id == id))
    }
}
