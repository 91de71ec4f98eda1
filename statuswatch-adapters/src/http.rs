//! Shared HTTP plumbing for the vendor adapters.

use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use statuswatch_sdk::FetchError;
use tokio::time::Instant;

use crate::error::transport_error;
use crate::ConfigurationError;

/// An HTTP client shared by all sources.
///
/// Cloning is cheap and shares the underlying connection pool.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    /// Build a client that identifies itself with `user_agent`.
    pub fn new(user_agent: &str) -> Result<Self, ConfigurationError> {
        let client = Client::builder()
            .user_agent(user_agent)
            .build()
            .map_err(|e| ConfigurationError::HttpClient(e.to_string()))?;
        Ok(Self { client })
    }

    /// Start a GET request that must finish by `deadline`.
    pub(crate) fn get(&self, url: &str, deadline: Instant) -> RequestBuilder {
        self.client
            .get(url)
            .timeout(deadline.saturating_duration_since(Instant::now()))
    }

    /// GET `url` and decode a successful JSON body.
    pub(crate) async fn get_json<T>(&self, url: &str, deadline: Instant) -> Result<T, FetchError>
    where
        T: DeserializeOwned,
    {
        let response = expect_ok(send(self.get(url, deadline)).await?)?;
        decode_json(&body(response).await?)
    }
}

/// Send a request, mapping transport failures.
pub(crate) async fn send(request: RequestBuilder) -> Result<Response, FetchError> {
    request.send().await.map_err(transport_error)
}

/// Reject anything but `200 OK`.
pub(crate) fn expect_ok(response: Response) -> Result<Response, FetchError> {
    match response.status() {
        StatusCode::OK => Ok(response),
        status => Err(FetchError::Status(status.as_u16())),
    }
}

/// Read the whole response body.
pub(crate) async fn body(response: Response) -> Result<Vec<u8>, FetchError> {
    response
        .bytes()
        .await
        .map(|b| b.to_vec())
        .map_err(transport_error)
}

/// Decode a JSON document.
pub(crate) fn decode_json<T: DeserializeOwned>(body: &[u8]) -> Result<T, FetchError> {
    serde_json::from_slice(body).map_err(|e| FetchError::Parse(e.to_string()))
}

/// Deserialize `null` as the type's default.
///
/// Status page APIs are loose about `null` versus absent fields.
pub(crate) fn nullable<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Prefix a scheme when missing and drop trailing slashes.
pub(crate) fn normalize_base_url(raw: &str) -> String {
    let raw = raw.trim();
    let with_scheme = if raw.starts_with("http") {
        raw.to_string()
    } else {
        format!("https://{}", raw)
    };
    with_scheme.trim_end_matches('/').to_string()
}

/// Check that `url` parses, naming the target on failure.
pub(crate) fn validate_url(page: &str, url: &str) -> Result<reqwest::Url, ConfigurationError> {
    reqwest::Url::parse(url).map_err(|e| ConfigurationError::InvalidUrl {
        page: page.to_string(),
        url: url.to_string(),
        reason: e.to_string(),
    })
}
