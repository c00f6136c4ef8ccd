mod auth;
mod basic;
mod client;

pub use auth::BasicAuth;
pub use basic::BasicClient;
pub use client::HttpClient;

use reqwest::header::{CONTENT_TYPE, HeaderValue};
use reqwest::{Method, Request, Response, Url};
use serde::Serialize;
use tracing::debug;

use crate::error::{Error, Result};

/// Builds a request, optionally with a JSON body, and runs it through `client`.
///
/// `action` names what the call is for and ends up in the error message.
pub async fn send_json<C: HttpClient, B: Serialize + ?Sized>(
    client: &C,
    action: &'static str,
    method: Method,
    url: Url,
    body: Option<&B>,
) -> Result<Response> {
    let mut req = Request::new(method, url);

    if let Some(body) = body {
        let bytes = serde_json::to_vec(body)
            .map_err(|e| Error::input(format!("Error encoding query: {e}")))?;
        // request bodies carry names and privileges only, never credentials
        debug!(
            action,
            method = %req.method(),
            url = %req.url(),
            body = %String::from_utf8_lossy(&bytes),
            "Sending request"
        );
        req.headers_mut()
            .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        *req.body_mut() = Some(bytes.into());
    }

    client
        .execute(req)
        .await
        .map_err(|source| Error::Transport { action, source })
}
