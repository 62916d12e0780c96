//! RunPod GraphQL API models.
//!
//! Every level of the `data.myself.pods` path is optional so that a partial
//! response degrades to an empty listing instead of a parse failure.

use serde::{Deserialize, Serialize};

/// Query listing the caller's pods with GPU runtime stats.
pub const POD_LIST_QUERY: &str = r"
query {
    myself {
        pods {
            id
            name
            runtime { gpus { id gpuUtilPercent memoryUtilPercent } }
            desiredStatus
            machine { gpuDisplayName }
        }
    }
}
";

// ============================================================================
// GraphQL envelope
// ============================================================================

/// GraphQL request body.
#[derive(Debug, Serialize)]
pub struct GraphQlRequest<'a> {
    /// Query text.
    pub query: &'a str,
}

/// GraphQL response wrapper.
#[derive(Debug, Deserialize)]
pub struct GraphQlResponse<T> {
    /// Response data.
    pub data: Option<T>,
    /// Errors reported by the server.
    #[serde(default)]
    pub errors: Option<Vec<GraphQlError>>,
}

/// GraphQL error entry.
#[derive(Debug, Deserialize)]
pub struct GraphQlError {
    /// Error message.
    pub message: String,
}

// ============================================================================
// Pod listing
// ============================================================================

/// `data` payload of the pod listing query.
#[derive(Debug, Default, Deserialize)]
pub struct MyselfData {
    /// Authenticated user.
    #[serde(default)]
    pub myself: Option<Myself>,
}

/// Authenticated user.
#[derive(Debug, Default, Deserialize)]
pub struct Myself {
    /// Pods owned by the user.
    #[serde(default)]
    pub pods: Option<Vec<PodResource>>,
}

/// Pod resource from the API.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PodResource {
    /// Pod ID.
    pub id: String,
    /// Pod name.
    #[serde(default)]
    pub name: Option<String>,
    /// Desired status.
    #[serde(default)]
    pub desired_status: Option<String>,
    /// Runtime info, null unless the pod is running.
    #[serde(default)]
    pub runtime: Option<PodRuntime>,
    /// Host machine info.
    #[serde(default)]
    pub machine: Option<PodMachine>,
}

/// Pod runtime info.
#[derive(Debug, Deserialize)]
pub struct PodRuntime {
    /// Attached GPUs.
    #[serde(default)]
    pub gpus: Option<Vec<RuntimeGpu>>,
}

/// GPU runtime stats.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuntimeGpu {
    /// GPU ID.
    #[serde(default)]
    pub id: Option<String>,
    /// Compute utilization percentage.
    #[serde(default)]
    pub gpu_util_percent: Option<f64>,
    /// Memory utilization percentage.
    #[serde(default)]
    pub memory_util_percent: Option<f64>,
}

/// Host machine info.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PodMachine {
    /// GPU display name (e.g. "RTX 4090").
    #[serde(default)]
    pub gpu_display_name: Option<String>,
}

impl MyselfData {
    /// Consume the payload, yielding the pods or an empty list.
    #[must_use]
    pub fn into_pods(self) -> Vec<PodResource> {
        self.myself.and_then(|m| m.pods).unwrap_or_default()
    }
}
