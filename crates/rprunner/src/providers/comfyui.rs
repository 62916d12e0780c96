//! ComfyUI reachability probe.
//!
//! Each RunPod pod exposes its HTTP ports through a per-pod proxy host. The
//! probe hits ComfyUI's `system_stats` endpoint there and treats every
//! failure as "not responding".

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::debug;

use crate::providers::traits::{DeviceStats, HealthProbe, PodError, SystemStats};

/// Placeholder substituted with the pod ID.
pub const POD_ID_PLACEHOLDER: &str = "{pod_id}";

/// Default `system_stats` URL on the RunPod proxy (ComfyUI listens on 8188).
pub const DEFAULT_URL_TEMPLATE: &str = "https://{pod_id}-8188.proxy.runpod.net/system_stats";

/// Default timeout for a probe.
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Raw `system_stats` body. A body without `devices` carries no stats.
#[derive(Debug, Deserialize)]
struct StatsBody {
    #[serde(default)]
    devices: Option<Vec<DeviceStats>>,
}

/// ComfyUI health probe.
#[derive(Debug, Clone)]
pub struct ComfyUi {
    /// HTTP client.
    client: Client,
    /// URL template containing [`POD_ID_PLACEHOLDER`].
    url_template: String,
}

impl ComfyUi {
    /// Create a probe against the RunPod proxy with a 10 second timeout.
    ///
    /// # Errors
    /// Returns error if HTTP client cannot be created.
    pub fn new() -> Result<Self, PodError> {
        Self::with_template(DEFAULT_URL_TEMPLATE)
    }

    /// Create a probe against a custom URL template.
    ///
    /// # Errors
    /// Returns [`PodError::Config`] if the template lacks `{pod_id}`.
    pub fn with_template(url_template: impl Into<String>) -> Result<Self, PodError> {
        let url_template = url_template.into();
        if !url_template.contains(POD_ID_PLACEHOLDER) {
            return Err(PodError::Config(format!(
                "health URL template must contain {POD_ID_PLACEHOLDER}: {url_template}"
            )));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            url_template,
        })
    }

    /// Replace the probe timeout.
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be rebuilt.
    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self, PodError> {
        self.client = Client::builder().timeout(timeout).build()?;
        Ok(self)
    }

    /// Stats URL for a pod.
    #[must_use]
    pub fn url_for(&self, pod_id: &str) -> String {
        self.url_template.replace(POD_ID_PLACEHOLDER, pod_id)
    }
}

#[async_trait]
impl HealthProbe for ComfyUi {
    async fn check_health(&self, pod_id: &str) -> Option<SystemStats> {
        let url = self.url_for(pod_id);
        debug!(pod_id = %pod_id, url = %url, "Probing ComfyUI");

        let response = match self.client.get(&url).send().await {
            Ok(response) => response,
            Err(e) => {
                debug!(pod_id = %pod_id, error = %e, "ComfyUI unreachable");
                return None;
            }
        };

        if response.status() != StatusCode::OK {
            debug!(pod_id = %pod_id, status = %response.status(), "ComfyUI not ready");
            return None;
        }

        match response.json::<StatsBody>().await {
            Ok(StatsBody {
                devices: Some(devices),
            }) => Some(SystemStats { devices }),
            Ok(StatsBody { devices: None }) => {
                debug!(pod_id = %pod_id, "ComfyUI stats carry no devices");
                None
            }
            Err(e) => {
                debug!(pod_id = %pod_id, error = %e, "Unreadable ComfyUI stats");
                None
            }
        }
    }
}
