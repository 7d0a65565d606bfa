//! HTTP transport shared by backend drivers.
//!
//! Wraps a `reqwest` client configured from a [`ProviderConfig`]: the
//! endpoint override, the credential sent as the `Authorization` header,
//! and the request timeout. The transport never retries.

mod error;

use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{trace, warn};

use crate::provider::ProviderConfig;

pub use error::TransportError;

/// Longest response body excerpt kept in errors.
const BODY_EXCERPT: usize = 500;

/// An HTTP client bound to one backend endpoint.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    http: reqwest::Client,
    base_url: String,
}

impl HttpTransport {
    /// Create a transport for `config`, using `default_endpoint` unless the
    /// configuration overrides it.
    pub fn new(config: &ProviderConfig, default_endpoint: &str) -> Result<Self, TransportError> {
        let mut headers = HeaderMap::new();
        if let Some(credential) = &config.api_authorization {
            let mut value = HeaderValue::from_str(credential.expose_secret())
                .map_err(|_| TransportError::Config("invalid API credential format".into()))?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.timeout())
            .build()?;

        Ok(Self {
            http,
            base_url: config
                .endpoint(default_endpoint)
                .trim_end_matches('/')
                .to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// GET `{base_url}/{path}` with query parameters and decode the JSON body.
    pub async fn get_json<T, Q>(&self, path: &str, query: &Q) -> Result<T, TransportError>
    where
        T: DeserializeOwned,
        Q: Serialize + ?Sized,
    {
        let url = format!("{}/{}", self.base_url, path.trim_start_matches('/'));
        trace!(%url, "GET");

        let response = self
            .http
            .get(&url)
            .query(query)
            .send()
            .await
            .inspect_err(|e| warn!(%url, error = %e, "request failed"))?;

        let status = response.status();

        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN
        {
            return Err(TransportError::Unauthorized);
        }

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(TransportError::RateLimited);
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(%url, status = status.as_u16(), "backend returned an error");
            return Err(TransportError::Api {
                status: status.as_u16(),
                message: body.chars().take(BODY_EXCERPT).collect(),
            });
        }

        let body = response.text().await?;

        serde_json::from_str(&body).map_err(|e| TransportError::Json {
            message: e.to_string(),
            body: Some(body.chars().take(BODY_EXCERPT).collect()),
        })
    }
}
