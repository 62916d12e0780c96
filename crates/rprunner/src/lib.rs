//! RunPod pod listing and ComfyUI health probing.
//!
//! This crate lists the GPU pods rented on a RunPod account and checks
//! whether ComfyUI answers on each running pod.
//!
//! ## Flow
//!
//! ```text
//! RUNPOD_API_KEY ──► RunPod (GraphQL) ──► pods
//!                                          │ desiredStatus == RUNNING
//!                                          ▼
//!                   ComfyUi probe ──► https://{pod_id}-8188.proxy.runpod.net/system_stats
//!                                          │
//!                                          ▼
//!                                   console report
//! ```
//!
//! Listing failures are returned to the caller. Probe failures are folded
//! into "not responding" and never abort the report.
//!
//! ## Example
//!
//! ```ignore
//! use rprunner::providers::{comfyui::ComfyUi, runpod::RunPod};
//! use rprunner::report::Reporter;
//!
//! let reporter = Reporter::new(RunPod::new(api_key)?, ComfyUi::new()?);
//! reporter.run(&mut std::io::stdout()).await?;
//! ```

pub mod credentials;
pub mod providers;
pub mod report;

pub use providers::comfyui;
pub use providers::runpod;
pub use providers::traits::{
    DeviceStats, GpuUtilization, HealthProbe, PodError, PodLister, PodRecord, SystemStats,
};
pub use report::{ReportSummary, Reporter};
