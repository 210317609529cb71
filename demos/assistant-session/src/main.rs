//! Instruments a two-step assistant workflow and submits one log record per call.
//!
//! The provider calls are simulated; set `HELICONE_API_KEY` (and optionally
//! `HELICONE_LOG_ENDPOINT`) to point the records at a real backend.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use calltrace::logger::{AsyncLogger, LoggerConfig};
use calltrace::primitives::SessionPath;
use calltrace::session::{ProviderCall, ProviderReply, Session};
use clap::Parser;
use serde_json::json;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(about = "Run an instrumented assistant session")]
struct Args {
    /// Human-readable session name shown by the telemetry backend.
    #[arg(long, default_value = "VisaCalculation")]
    session_name: String,

    /// Root path of the session tree.
    #[arg(long, default_value = "/visa-calculator")]
    path: String,

    /// Override the log submission endpoint.
    #[arg(long)]
    endpoint: Option<String>,

    /// Per-submission deadline in milliseconds.
    #[arg(long, default_value_t = 10_000)]
    timeout_ms: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let args = Args::parse();

    let mut config = LoggerConfig::from_env()?.with_timeout(Duration::from_millis(args.timeout_ms));
    if let Some(endpoint) = &args.endpoint {
        config = config.with_endpoint(endpoint)?;
    }
    let logger = Arc::new(AsyncLogger::new(config).context("set HELICONE_API_KEY")?);

    let root = SessionPath::new(args.path).context("invalid --path")?;
    let session = Session::new(logger, args.session_name, root);
    info!(session_id = %session.correlation().session_id(), "session started");

    let assistant_id = session
        .instrument(
            ProviderCall::new(
                "https://api.openai.com/v1/assistants",
                json!({ "model": "gpt-4o-mini", "data": [{ "model": "gpt-4o-mini" }] }),
            ),
            create_assistant,
        )
        .await?;
    info!(%assistant_id, "assistant created");

    let result = session.child("cost-calculation")?.child("result")?;
    let run_status = result
        .instrument(
            ProviderCall::new("https://api.openai.com/v1/threads/runs", json!({})),
            || run_assistant(&assistant_id),
        )
        .await?;
    info!(%run_status, "run finished");

    Ok(())
}

async fn create_assistant() -> Result<ProviderReply<String>> {
    tokio::time::sleep(Duration::from_millis(120)).await;
    let assistant_id = "asst_demo_0001".to_owned();
    Ok(ProviderReply::new(
        assistant_id.clone(),
        200,
        json!({
            "call": "CreateAssistant",
            "data": [{
                "assistant_id": assistant_id,
                "model": "gpt-4o-mini",
                "usage": { "prompt_tokens": 0, "completion_tokens": 0, "total_tokens": 0 }
            }]
        }),
    ))
}

async fn run_assistant(assistant_id: &str) -> Result<ProviderReply<String>> {
    tokio::time::sleep(Duration::from_millis(350)).await;
    let status = "completed".to_owned();
    Ok(ProviderReply::new(
        status.clone(),
        200,
        json!({
            "model": "gpt-4o-mini",
            "call": "CreateAndPollRun",
            "assistant_id": assistant_id,
            "status": status,
            "usage": { "prompt_tokens": 412, "completion_tokens": 96, "total_tokens": 508 }
        }),
    ))
}
