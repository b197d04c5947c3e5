//! HTTP client for the Immich API.
//!
//! The client makes exactly one outbound request per call, with no retries.
//! Ordinary remote failures (transport errors, non-2xx statuses, bodies that
//! are not JSON objects) never cross the call boundary as errors: they are
//! logged here and reported as [`RelayOutcome::Failed`], so a caller looping
//! over a batch can keep going. Only contract violations, such as an
//! endpoint that cannot resolve against the configured base URL, surface as
//! [`RelayFault`].

use reqwest::{header, Client, Method};
use serde_json::{json, Map, Value};
use tracing::error;
use url::Url;

use crate::Config;

/// Outcome of one relay call.
#[derive(Debug)]
pub enum RelayOutcome {
    /// The remote answered 2xx with a JSON object body.
    Success(Map<String, Value>),
    /// The remote call failed in an ordinary, recoverable way. Already
    /// logged; callers may continue.
    Failed(RelayError),
}

/// Ordinary remote failure, recovered inside the client.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} returned status {status}")]
    Status { url: String, status: u16 },

    #[error("response from {url} is not a JSON object: {source}")]
    InvalidBody {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

/// Contract-violating failure. Aborts the caller's batch.
#[derive(Debug, thiserror::Error)]
pub enum RelayFault {
    #[error("invalid Immich base URL {url:?}: {source}")]
    BaseUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("endpoint {endpoint:?} does not resolve against the base URL: {source}")]
    Endpoint {
        endpoint: String,
        #[source]
        source: url::ParseError,
    },

    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}

/// Client for relaying requests to the Immich server.
#[derive(Debug, Clone)]
pub struct RelayClient {
    http: Client,
    base_url: Url,
    api_key: String,
}

impl RelayClient {
    /// Create a client from the process configuration.
    ///
    /// Parses the base URL once; a malformed `IMMICH_URL` is a fault at
    /// startup rather than on every request.
    pub fn new(config: &Config) -> Result<Self, RelayFault> {
        let base_url = Url::parse(&config.immich_url).map_err(|source| RelayFault::BaseUrl {
            url: config.immich_url.clone(),
            source,
        })?;

        let http = Client::builder()
            .timeout(std::time::Duration::from_millis(config.request_timeout_ms))
            .build()
            .map_err(RelayFault::Client)?;

        Ok(Self {
            http,
            base_url,
            api_key: config.immich_api_key.clone(),
        })
    }

    /// Make one API call to the Immich server.
    ///
    /// `endpoint` is resolved against the configured base URL. The request
    /// carries a JSON content type and the configured `X-Api-Key`.
    pub async fn call(
        &self,
        endpoint: &str,
        method: Method,
        payload: &Value,
    ) -> Result<RelayOutcome, RelayFault> {
        let url = self
            .base_url
            .join(endpoint)
            .map_err(|source| RelayFault::Endpoint {
                endpoint: endpoint.to_string(),
                source,
            })?;

        let response = match self
            .http
            .request(method, url.clone())
            .header(header::CONTENT_TYPE, "application/json")
            .header("X-Api-Key", &self.api_key)
            .json(payload)
            .send()
            .await
        {
            Ok(resp) => resp,
            Err(e) => {
                error!(url = %url, error = %e, "relay_call_transport_failed");
                return Ok(RelayOutcome::Failed(RelayError::Transport {
                    url: url.to_string(),
                    source: e,
                }));
            }
        };

        let status = response.status();
        if !status.is_success() {
            error!(url = %url, status = status.as_u16(), "relay_call_bad_status");
            return Ok(RelayOutcome::Failed(RelayError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            }));
        }

        match response.json::<Map<String, Value>>().await {
            Ok(body) => Ok(RelayOutcome::Success(body)),
            Err(e) => {
                error!(url = %url, error = %e, "relay_call_invalid_body");
                Ok(RelayOutcome::Failed(RelayError::InvalidBody {
                    url: url.to_string(),
                    source: e,
                }))
            }
        }
    }

    /// Add an asset to an album in Immich.
    pub async fn add_to_album(
        &self,
        album_id: &str,
        asset_id: &str,
    ) -> Result<RelayOutcome, RelayFault> {
        self.call(
            &format!("api/albums/{}/assets", album_id),
            Method::PUT,
            &json!({ "ids": [asset_id] }),
        )
        .await
    }
}
