//! Pod provider traits and common types.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Desired status reported for pods that are up.
pub const RUNNING_STATUS: &str = "RUNNING";

/// Errors that can occur while listing pods or rendering a report.
#[derive(Error, Debug)]
pub enum PodError {
    /// No API key was supplied.
    #[error("RUNPOD_API_KEY is not set")]
    MissingCredential,

    /// HTTP request failed at the transport layer.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The API rejected the credential.
    #[error("Authentication failed with status {status}")]
    Auth { status: u16 },

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// GraphQL returned errors and no data.
    #[error("GraphQL errors: {0}")]
    GraphQl(String),

    /// Response body was not valid JSON.
    #[error("Failed to parse response: {0}")]
    Parse(#[from] serde_json::Error),

    /// Writing the report failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Runtime utilization of one GPU attached to a pod.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GpuUtilization {
    /// GPU identifier.
    pub id: String,
    /// Compute utilization percentage.
    pub gpu_util_percent: Option<f64>,
    /// Memory utilization percentage.
    pub memory_util_percent: Option<f64>,
}

/// A rented GPU pod.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PodRecord {
    /// Provider-assigned pod identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Desired status (`RUNNING`, `EXITED`, ...). Kept as an open string.
    pub desired_status: String,
    /// GPU display name, when the machine is known.
    pub gpu_display_name: Option<String>,
    /// Per-GPU runtime utilization. Only present while the pod runs.
    pub gpus: Option<Vec<GpuUtilization>>,
}

impl PodRecord {
    /// Whether the provider wants this pod running.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.desired_status == RUNNING_STATUS
    }
}

/// One device entry from a ComfyUI `system_stats` payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeviceStats {
    /// Device name.
    #[serde(default)]
    pub name: Option<String>,
    /// Total VRAM in bytes.
    #[serde(default)]
    pub vram_total: Option<f64>,
    /// Free VRAM in bytes.
    #[serde(default)]
    pub vram_free: Option<f64>,
}

/// Parsed ComfyUI `system_stats` payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SystemStats {
    /// Devices visible to ComfyUI.
    #[serde(default)]
    pub devices: Vec<DeviceStats>,
}

impl SystemStats {
    /// Used and total VRAM of the first device, in bytes.
    ///
    /// Missing numbers count as zero, except the displayed total which
    /// falls back to 1 so ratios stay defined.
    #[must_use]
    pub fn primary_vram(&self) -> (f64, f64) {
        let device = self.devices.first().cloned().unwrap_or_default();
        let used = device.vram_total.unwrap_or(0.0) - device.vram_free.unwrap_or(0.0);
        let total = device.vram_total.unwrap_or(1.0);
        (used, total)
    }
}

/// Source of pod listings.
#[async_trait]
pub trait PodLister: Send + Sync {
    /// List all pods owned by the authenticated account.
    async fn list_pods(&self) -> Result<Vec<PodRecord>, PodError>;
}

/// Best-effort probe of the companion service on a pod.
#[async_trait]
pub trait HealthProbe: Send + Sync {
    /// Fetch service stats. Any failure yields `None`.
    async fn check_health(&self, pod_id: &str) -> Option<SystemStats>;
}
