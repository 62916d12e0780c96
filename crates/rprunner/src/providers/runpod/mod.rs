//! RunPod pod provider.
//!
//! Implements the [`PodLister`](crate::providers::traits::PodLister) trait
//! against the RunPod GraphQL API.
//!
//! ## Example
//!
//! ```ignore
//! use rprunner::providers::runpod::RunPod;
//! use rprunner::providers::traits::PodLister;
//!
//! let provider = RunPod::new(api_key)?;
//!
//! for pod in provider.list_pods().await? {
//!     println!("{} {}", pod.id, pod.desired_status);
//! }
//! ```

mod client;
mod models;

pub use client::{RunPod, API_URL};
pub use models::POD_LIST_QUERY;
