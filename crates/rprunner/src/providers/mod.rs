//! Pod provider implementations.
//!
//! This module contains the [`PodLister`] and [`HealthProbe`] traits, the
//! RunPod GraphQL client and the ComfyUI probe.

pub mod comfyui;
pub mod runpod;
pub mod traits;

pub use traits::{
    DeviceStats, GpuUtilization, HealthProbe, PodError, PodLister, PodRecord, SystemStats,
};
