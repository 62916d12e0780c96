//! Console report over a pod listing.

use std::io::Write;
use std::pin::pin;

use futures::StreamExt;
use tracing::{debug, info};

use crate::credentials::API_KEY_ENV;
use crate::providers::traits::{HealthProbe, PodError, PodLister, PodRecord, SystemStats};

/// Label used when the API does not report a GPU.
const UNKNOWN_GPU: &str = "Unknown GPU";

/// Bytes per displayed gigabyte.
const BYTES_PER_GB: f64 = 1e9;

const FOOTER: &str = "\
---
This is the basic foundation. The full rpRunner suite adds:
  • 15+ video models (Veo, Kling, Luma, Minimax, etc.)
  • Voice synthesis with emotion control
  • Sound effects generation
  • 259 ComfyUI templates
  • Batch processing with resume
  • And much more...

📧 Contact: allan@titlecuts.com
";

/// Counts gathered while rendering a report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReportSummary {
    /// Pods listed.
    pub pods: usize,
    /// Pods whose desired status is `RUNNING`.
    pub running: usize,
    /// Running pods whose ComfyUI answered.
    pub responding: usize,
}

/// Lists pods and probes the running ones.
pub struct Reporter<L, P> {
    lister: L,
    probe: P,
    concurrency: usize,
}

impl<L: PodLister, P: HealthProbe> Reporter<L, P> {
    /// Create a reporter that probes one pod at a time.
    pub fn new(lister: L, probe: P) -> Self {
        Self {
            lister,
            probe,
            concurrency: 1,
        }
    }

    /// Allow up to `concurrency` probes in flight. Output order is unchanged.
    ///
    /// # Errors
    /// Returns [`PodError::Config`] if `concurrency` is zero.
    pub fn with_concurrency(mut self, concurrency: usize) -> Result<Self, PodError> {
        if concurrency == 0 {
            return Err(PodError::Config(
                "concurrency must be at least 1".to_string(),
            ));
        }
        self.concurrency = concurrency;
        Ok(self)
    }

    /// Write the full report to `out`.
    ///
    /// # Errors
    /// Returns the listing error, or an I/O error from `out`. Probe failures
    /// are rendered, never returned.
    pub async fn run<W: Write>(&self, out: &mut W) -> Result<ReportSummary, PodError> {
        writeln!(out, "🔍 Fetching your RunPod pods...\n")?;

        let pods = self.lister.list_pods().await?;
        let mut summary = ReportSummary {
            pods: pods.len(),
            ..ReportSummary::default()
        };

        if pods.is_empty() {
            writeln!(out, "No pods found. Create one at https://runpod.io")?;
            return Ok(summary);
        }

        let mut blocks = pin!(futures::stream::iter(&pods)
            .map(|pod| async move {
                let health = if pod.is_running() {
                    self.probe.check_health(&pod.id).await
                } else {
                    None
                };
                (pod, health)
            })
            .buffered(self.concurrency));

        while let Some((pod, health)) = blocks.next().await {
            if pod.is_running() {
                summary.running += 1;
                if health.is_some() {
                    summary.responding += 1;
                }
            }
            write_pod(out, pod, health.as_ref())?;
        }

        out.write_all(FOOTER.as_bytes())?;

        info!(
            pods = summary.pods,
            running = summary.running,
            responding = summary.responding,
            "Report complete"
        );
        Ok(summary)
    }
}

/// Write one pod block followed by a blank line.
fn write_pod<W: Write>(
    out: &mut W,
    pod: &PodRecord,
    health: Option<&SystemStats>,
) -> Result<(), PodError> {
    let glyph = if pod.is_running() { "✅" } else { "⏸️" };
    let gpu = pod.gpu_display_name.as_deref().unwrap_or(UNKNOWN_GPU);

    writeln!(out, "{glyph} {} ({})", pod.name, pod.id)?;
    writeln!(out, "   GPU: {gpu}")?;
    writeln!(out, "   Status: {}", pod.desired_status)?;

    if pod.is_running() {
        match health {
            Some(stats) => {
                let (used, total) = stats.primary_vram();
                debug!(pod_id = %pod.id, used, total, "ComfyUI VRAM");
                writeln!(
                    out,
                    "   ComfyUI: ✅ Running ({:.1}/{:.1} GB VRAM)",
                    used / BYTES_PER_GB,
                    total / BYTES_PER_GB
                )?;
            }
            None => writeln!(out, "   ComfyUI: ❌ Not responding")?,
        }
    }
    writeln!(out)?;
    Ok(())
}

/// Explain how to supply the API key.
///
/// # Errors
/// Returns an I/O error from `out`.
pub fn write_credential_guidance<W: Write>(out: &mut W) -> Result<(), PodError> {
    writeln!(out, "❌ Set {API_KEY_ENV} environment variable")?;
    writeln!(out, "   export {API_KEY_ENV}='your_key_here'")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::providers::traits::DeviceStats;

    struct FakeLister {
        pods: Vec<PodRecord>,
    }

    #[async_trait]
    impl PodLister for FakeLister {
        async fn list_pods(&self) -> Result<Vec<PodRecord>, PodError> {
            Ok(self.pods.clone())
        }
    }

    struct FailingLister;

    #[async_trait]
    impl PodLister for FailingLister {
        async fn list_pods(&self) -> Result<Vec<PodRecord>, PodError> {
            Err(PodError::Auth { status: 401 })
        }
    }

    #[derive(Default)]
    struct FakeProbe {
        responses: HashMap<String, SystemStats>,
        calls: Mutex<Vec<String>>,
    }

    impl FakeProbe {
        fn with(mut self, pod_id: &str, total: f64, free: f64) -> Self {
            self.responses.insert(
                pod_id.to_string(),
                SystemStats {
                    devices: vec![DeviceStats {
                        name: Some("cuda:0".to_string()),
                        vram_total: Some(total),
                        vram_free: Some(free),
                    }],
                },
            );
            self
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl HealthProbe for &FakeProbe {
        async fn check_health(&self, pod_id: &str) -> Option<SystemStats> {
            self.calls.lock().unwrap().push(pod_id.to_string());
            self.responses.get(pod_id).cloned()
        }
    }

    fn pod(id: &str, name: &str, status: &str, gpu: Option<&str>) -> PodRecord {
        PodRecord {
            id: id.to_string(),
            name: name.to_string(),
            desired_status: status.to_string(),
            gpu_display_name: gpu.map(str::to_string),
            gpus: None,
        }
    }

    fn fixture() -> Vec<PodRecord> {
        vec![
            pod("p1", "flux-worker", "RUNNING", Some("RTX 4090")),
            pod("p2", "archive", "EXITED", None),
            pod("p3", "wan-video", "RUNNING", Some("A100 80GB")),
        ]
    }

    async fn render<L: PodLister>(lister: L, probe: &FakeProbe, concurrency: usize) -> String {
        let reporter = Reporter::new(lister, probe)
            .with_concurrency(concurrency)
            .unwrap();
        let mut out = Vec::new();
        reporter.run(&mut out).await.unwrap();
        String::from_utf8(out).unwrap()
    }

    #[tokio::test]
    async fn test_no_pods_skips_probes_and_footer() {
        let probe = FakeProbe::default();
        let output = render(FakeLister { pods: vec![] }, &probe, 1).await;

        assert_eq!(
            output,
            "🔍 Fetching your RunPod pods...\n\nNo pods found. Create one at https://runpod.io\n"
        );
        assert!(probe.calls().is_empty());
    }

    #[tokio::test]
    async fn test_only_running_pods_are_probed() {
        let probe = FakeProbe::default();
        render(FakeLister { pods: fixture() }, &probe, 1).await;

        assert_eq!(probe.calls(), vec!["p1".to_string(), "p3".to_string()]);
    }

    #[tokio::test]
    async fn test_vram_usage_is_rendered_in_gb() {
        let probe = FakeProbe::default().with("p1", 16e9, 6e9);
        let output = render(
            FakeLister {
                pods: vec![pod("p1", "flux-worker", "RUNNING", Some("RTX 4090"))],
            },
            &probe,
            1,
        )
        .await;

        assert!(output.contains("   ComfyUI: ✅ Running (10.0/16.0 GB VRAM)\n"));
    }

    #[tokio::test]
    async fn test_unreachable_probe_is_not_responding() {
        let probe = FakeProbe::default();
        let output = render(
            FakeLister {
                pods: vec![pod("p1", "flux-worker", "RUNNING", None)],
            },
            &probe,
            1,
        )
        .await;

        assert!(output.contains("   ComfyUI: ❌ Not responding\n"));
        assert!(output.contains("   GPU: Unknown GPU\n"));
    }

    #[tokio::test]
    async fn test_full_report_is_deterministic() {
        let expected = "\
🔍 Fetching your RunPod pods...

✅ flux-worker (p1)
   GPU: RTX 4090
   Status: RUNNING
   ComfyUI: ✅ Running (10.0/16.0 GB VRAM)

⏸️ archive (p2)
   GPU: Unknown GPU
   Status: EXITED

✅ wan-video (p3)
   GPU: A100 80GB
   Status: RUNNING
   ComfyUI: ❌ Not responding

"
        .to_string()
            + FOOTER;

        for concurrency in [1, 1, 4] {
            let probe = FakeProbe::default().with("p1", 16e9, 6e9);
            let output = render(FakeLister { pods: fixture() }, &probe, concurrency).await;
            assert_eq!(output, expected);
        }
    }

    #[tokio::test]
    async fn test_summary_counts() {
        let probe = FakeProbe::default().with("p3", 80e9, 70e9);
        let reporter = Reporter::new(FakeLister { pods: fixture() }, &probe);
        let summary = reporter.run(&mut Vec::<u8>::new()).await.unwrap();

        assert_eq!(
            summary,
            ReportSummary {
                pods: 3,
                running: 2,
                responding: 1,
            }
        );
    }

    #[tokio::test]
    async fn test_listing_error_propagates_without_probes() {
        let probe = FakeProbe::default();
        let reporter = Reporter::new(FailingLister, &probe);
        let mut out = Vec::new();

        let err = reporter.run(&mut out).await.unwrap_err();

        assert!(matches!(err, PodError::Auth { status: 401 }));
        assert!(probe.calls().is_empty());
    }

    #[test]
    fn test_zero_concurrency_rejected() {
        let probe = FakeProbe::default();
        let result = Reporter::new(FakeLister { pods: vec![] }, &probe).with_concurrency(0);
        assert!(matches!(result, Err(PodError::Config(_))));
    }

    #[test]
    fn test_credential_guidance() {
        let mut out = Vec::new();
        write_credential_guidance(&mut out).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "❌ Set RUNPOD_API_KEY environment variable\n   export RUNPOD_API_KEY='your_key_here'\n"
        );
    }
}
