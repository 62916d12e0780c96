//! rpRunner CLI - list RunPod pods and check ComfyUI on the running ones.

use std::io::Write;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use rprunner::comfyui::{ComfyUi, DEFAULT_TIMEOUT_SECS, DEFAULT_URL_TEMPLATE};
use rprunner::credentials::require_api_key;
use rprunner::report::{write_credential_guidance, Reporter};
use rprunner::runpod::{RunPod, API_URL};
use rprunner::PodError;

/// Exit status when no API key is configured.
const EXIT_MISSING_CREDENTIAL: u8 = 2;

/// rpRunner - inspect RunPod pods and their ComfyUI status.
#[derive(Parser)]
#[command(name = "rprunner")]
#[command(about = "List RunPod pods and check ComfyUI on running pods")]
struct Cli {
    /// RunPod API key (or set `RUNPOD_API_KEY` env var).
    #[arg(long, env = "RUNPOD_API_KEY", default_value = "", hide_env_values = true)]
    api_key: String,

    /// RunPod GraphQL endpoint.
    #[arg(long, env = "RUNPOD_API_URL", default_value = API_URL)]
    api_url: String,

    /// Timeout for the pod listing request in seconds (unbounded if unset).
    #[arg(long, env = "RUNPOD_API_TIMEOUT")]
    api_timeout: Option<u64>,

    /// ComfyUI stats URL; `{pod_id}` is replaced with each pod ID.
    #[arg(long, env = "COMFYUI_URL_TEMPLATE", default_value = DEFAULT_URL_TEMPLATE)]
    health_url_template: String,

    /// Timeout for each ComfyUI probe in seconds.
    #[arg(long, env = "COMFYUI_TIMEOUT", default_value_t = DEFAULT_TIMEOUT_SECS)]
    health_timeout: u64,

    /// Maximum ComfyUI probes in flight.
    #[arg(long, env = "RPRUNNER_CONCURRENCY", default_value_t = 1)]
    concurrency: usize,

    /// Enable verbose logging.
    #[arg(short, long, default_value = "false")]
    verbose: bool,
}

/// How a run ended without an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    /// The report was written.
    Reported,
    /// No API key; guidance was written instead.
    MissingCredential,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Logs go to stderr so the report on stdout stays clean
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("warn")
        }
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let mut stdout = std::io::stdout().lock();
    match execute(&cli, &mut stdout).await {
        Ok(Outcome::Reported) => ExitCode::SUCCESS,
        Ok(Outcome::MissingCredential) => ExitCode::from(EXIT_MISSING_CREDENTIAL),
        Err(e) => {
            eprintln!("❌ {e:#}");
            ExitCode::FAILURE
        }
    }
}

/// Check the credential, then build the clients and write the report.
async fn execute<W: Write>(cli: &Cli, out: &mut W) -> Result<Outcome> {
    let Ok(api_key) = require_api_key(Some(&cli.api_key)) else {
        write_credential_guidance(out)?;
        return Ok(Outcome::MissingCredential);
    };

    let mut lister =
        RunPod::with_url(api_key, &cli.api_url).context("Failed to create RunPod client")?;
    if let Some(secs) = cli.api_timeout {
        lister = lister
            .with_timeout(Duration::from_secs(secs))
            .context("Failed to configure RunPod client")?;
    }

    let probe = ComfyUi::with_template(&cli.health_url_template)
        .and_then(|p| p.with_timeout(Duration::from_secs(cli.health_timeout)))
        .context("Failed to create ComfyUI probe")?;

    let reporter = Reporter::new(lister, probe).with_concurrency(cli.concurrency)?;
    reporter.run(out).await.map_err(report_error)?;

    Ok(Outcome::Reported)
}

/// Attach context matching where a report failed.
fn report_error(err: PodError) -> anyhow::Error {
    match err {
        PodError::Io(e) => anyhow::Error::new(e).context("Failed to write report"),
        other => anyhow::Error::new(other).context("Failed to list pods"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn default_of(id: &str) -> String {
        let cmd = Cli::command();
        let arg = cmd
            .get_arguments()
            .find(|a| a.get_id().as_str() == id)
            .unwrap();
        arg.get_default_values()[0].to_string_lossy().into_owned()
    }

    fn cli_for(server: &MockServer, api_key: &str) -> Cli {
        Cli::try_parse_from([
            "rprunner".to_string(),
            format!("--api-key={api_key}"),
            format!("--api-url={}/graphql", server.uri()),
            format!("--health-url-template={}/{{pod_id}}/system_stats", server.uri()),
            "--health-timeout=1".to_string(),
            "--concurrency=1".to_string(),
        ])
        .unwrap()
    }

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_cli_defaults() {
        assert_eq!(default_of("api_key"), "");
        assert_eq!(default_of("api_url"), API_URL);
        assert_eq!(default_of("health_url_template"), DEFAULT_URL_TEMPLATE);
        assert_eq!(default_of("health_timeout"), "10");
        assert_eq!(default_of("concurrency"), "1");
    }

    #[tokio::test]
    async fn test_blank_api_key_makes_no_request() {
        for api_key in ["", "   "] {
            let server = MockServer::start().await;
            Mock::given(method("POST"))
                .respond_with(ResponseTemplate::new(200))
                .expect(0)
                .mount(&server)
                .await;

            let mut out = Vec::new();
            let outcome = execute(&cli_for(&server, api_key), &mut out).await.unwrap();

            assert_eq!(outcome, Outcome::MissingCredential);
            assert_eq!(
                String::from_utf8(out).unwrap(),
                "❌ Set RUNPOD_API_KEY environment variable\n   export RUNPOD_API_KEY='your_key_here'\n"
            );
            assert!(server.received_requests().await.unwrap().is_empty());
        }
    }

    #[tokio::test]
    async fn test_execute_writes_report() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": { "myself": { "pods": [] } }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let mut out = Vec::new();
        let outcome = execute(&cli_for(&server, "k"), &mut out).await.unwrap();

        assert_eq!(outcome, Outcome::Reported);
        assert!(String::from_utf8(out)
            .unwrap()
            .ends_with("No pods found. Create one at https://runpod.io\n"));
    }

    #[tokio::test]
    async fn test_listing_failure_context() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("down"))
            .mount(&server)
            .await;

        let err = execute(&cli_for(&server, "k"), &mut Vec::<u8>::new())
            .await
            .unwrap_err();
        assert!(format!("{err:#}").starts_with("Failed to list pods: API error: 500"));
    }

    #[test]
    fn test_write_failure_context() {
        let err = report_error(PodError::Io(std::io::Error::new(
            std::io::ErrorKind::BrokenPipe,
            "pipe closed",
        )));
        assert_eq!(format!("{err:#}"), "Failed to write report: pipe closed");

        let err = report_error(PodError::Auth { status: 401 });
        assert_eq!(
            format!("{err:#}"),
            "Failed to list pods: Authentication failed with status 401"
        );
    }
}
