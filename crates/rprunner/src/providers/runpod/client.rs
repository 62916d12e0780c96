//! RunPod GraphQL API client implementation.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use tracing::{debug, info, warn};

use super::models::{GraphQlRequest, GraphQlResponse, MyselfData, PodResource, POD_LIST_QUERY};
use crate::providers::traits::{GpuUtilization, PodError, PodLister, PodRecord};

/// RunPod GraphQL endpoint.
pub const API_URL: &str = "https://api.runpod.io/graphql";

/// Status reported when the API omits `desiredStatus`.
const UNKNOWN_STATUS: &str = "UNKNOWN";

/// RunPod pod provider.
#[derive(Clone)]
pub struct RunPod {
    /// HTTP client.
    client: Client,
    /// API key for authentication.
    api_key: String,
    /// GraphQL endpoint.
    api_url: String,
}

impl std::fmt::Debug for RunPod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunPod")
            .field("api_url", &self.api_url)
            .finish_non_exhaustive()
    }
}

impl RunPod {
    /// Create a new RunPod provider against the public API.
    ///
    /// Requests carry no timeout; use [`RunPod::with_timeout`] to bound them.
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be created.
    pub fn new(api_key: impl Into<String>) -> Result<Self, PodError> {
        Self::with_url(api_key, API_URL)
    }

    /// Create a provider against a custom GraphQL endpoint.
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be created.
    pub fn with_url(
        api_key: impl Into<String>,
        api_url: impl Into<String>,
    ) -> Result<Self, PodError> {
        let client = Client::builder().build()?;

        Ok(Self {
            client,
            api_key: api_key.into(),
            api_url: api_url.into(),
        })
    }

    /// Bound every request to `timeout`.
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be rebuilt.
    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self, PodError> {
        self.client = Client::builder().timeout(timeout).build()?;
        Ok(self)
    }

    /// Make an authenticated GraphQL query.
    async fn query<T: serde::de::DeserializeOwned>(
        &self,
        query: &str,
    ) -> Result<Option<T>, PodError> {
        debug!(url = %self.api_url, "GraphQL request");

        let response = self
            .client
            .post(&self.api_url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&GraphQlRequest { query })
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Handle API response, parsing the GraphQL envelope or error.
    async fn handle_response<T: serde::de::DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<Option<T>, PodError> {
        let status = response.status();
        let text = response.text().await?;

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(PodError::Auth {
                status: status.as_u16(),
            });
        }
        if !status.is_success() {
            return Err(PodError::Api {
                status: status.as_u16(),
                message: text,
            });
        }

        let envelope: Option<GraphQlResponse<T>> = serde_json::from_str(&text).map_err(|e| {
            warn!(error = %e, body = %text, "Failed to parse response");
            PodError::Parse(e)
        })?;
        let Some(envelope) = envelope else {
            return Ok(None);
        };

        if let Some(errors) = envelope.errors.filter(|e| !e.is_empty()) {
            let messages: Vec<_> = errors.iter().map(|e| e.message.as_str()).collect();
            let joined = messages.join(", ");
            if envelope.data.is_none() {
                return Err(PodError::GraphQl(joined));
            }
            warn!(errors = %joined, "GraphQL returned partial data");
        }

        Ok(envelope.data)
    }

    /// Convert API pod resource to our `PodRecord` type.
    fn to_pod_record(resource: PodResource) -> PodRecord {
        let gpus = resource.runtime.and_then(|r| r.gpus).map(|gpus| {
            gpus.into_iter()
                .map(|g| GpuUtilization {
                    id: g.id.unwrap_or_default(),
                    gpu_util_percent: g.gpu_util_percent,
                    memory_util_percent: g.memory_util_percent,
                })
                .collect()
        });

        PodRecord {
            id: resource.id,
            name: resource.name.unwrap_or_default(),
            desired_status: resource
                .desired_status
                .unwrap_or_else(|| UNKNOWN_STATUS.to_string()),
            gpu_display_name: resource.machine.and_then(|m| m.gpu_display_name),
            gpus,
        }
    }
}

#[async_trait]
impl PodLister for RunPod {
    async fn list_pods(&self) -> Result<Vec<PodRecord>, PodError> {
        let data: Option<MyselfData> = self.query(POD_LIST_QUERY).await?;
        let pods: Vec<PodRecord> = data
            .map(MyselfData::into_pods)
            .unwrap_or_default()
            .into_iter()
            .map(Self::to_pod_record)
            .collect();

        info!(count = pods.len(), "Listed pods");
        Ok(pods)
    }
}
