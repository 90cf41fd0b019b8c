use std::fmt;
use std::sync::Arc;

use reqwest::{Client, Method, RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::domain::errors::RemoteError;
use crate::domain::ports::TokenStore;

use super::models::ErrorBody;

// ── Error conversions (infrastructure concern only) ──────────────────────────

impl From<reqwest::Error> for RemoteError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            RemoteError::Decode(e.to_string())
        } else {
            RemoteError::Transport(e.to_string())
        }
    }
}

// ── Client ────────────────────────────────────────────────────────────────────

/// Shared HTTP plumbing for every backend service reached through the gateway.
///
/// Each request carries the stored bearer token. A 401 answer discards that
/// token so the next session start forces a new sign-in.
#[derive(Clone)]
pub struct ApiClient {
    base_url: Url,
    http: Client,
    tokens: Arc<dyn TokenStore>,
}

impl fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url.as_str())
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    pub fn new(base_url: &str, tokens: Arc<dyn TokenStore>) -> Result<Self, RemoteError> {
        let base_url = Url::parse(base_url)
            .map_err(|e| {
                RemoteError::Transport(format!("invalid base url '{}': {}", base_url, e))
            })?;
        if base_url.cannot_be_a_base() {
            return Err(RemoteError::Transport(format!(
                "base url '{}' cannot carry a path",
                base_url
            )));
        }
        Ok(Self {
            base_url,
            http: Client::new(),
            tokens,
        })
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    /// Joins percent-encoded path segments onto the base url.
    pub(crate) fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    pub(crate) fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let token = match self.tokens.token() {
            Ok(token) => token,
            Err(e) => {
                log::warn!("Could not read stored token: {}", e);
                None
            }
        };
        self.request_with_token(method, url, token.as_deref())
    }

    pub(crate) fn request_with_token(
        &self,
        method: Method,
        url: Url,
        token: Option<&str>,
    ) -> RequestBuilder {
        let builder = self.http.request(method, url);
        match token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Sends the request and turns every non-2xx status into a `RemoteError`.
    pub(crate) async fn execute(&self, builder: RequestBuilder) -> Result<Response, RemoteError> {
        let response = builder.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        if status == StatusCode::UNAUTHORIZED {
            log::warn!("Session expired or unauthorized, discarding stored token");
            if let Err(e) = self.tokens.clear_token() {
                log::error!("Failed to discard stored token: {}", e);
            }
            return Err(RemoteError::Unauthorized);
        }

        let text = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&text)
            .ok()
            .and_then(|b| b.message)
            .filter(|m| !m.trim().is_empty());
        log::debug!("Backend answered {}: {}", status, text);
        Err(RemoteError::Status {
            status: status.as_u16(),
            message,
        })
    }

    pub(crate) async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, RemoteError> {
        let response = self.execute(self.request(Method::GET, url)).await?;
        Ok(response.json().await?)
    }

    pub(crate) async fn send_json<B, T>(
        &self,
        method: Method,
        url: Url,
        body: &B,
    ) -> Result<T, RemoteError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self.execute(self.request(method, url).json(body)).await?;
        Ok(response.json().await?)
    }

    /// For endpoints whose body, if any, is of no interest.
    pub(crate) async fn send_empty(&self, method: Method, url: Url) -> Result<(), RemoteError> {
        self.execute(self.request(method, url)).await?;
        Ok(())
    }
}
