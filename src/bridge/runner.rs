//! Bridge runner
//!
//! Entry point for running one gemini turn and printing the report.

use std::io::Write as _;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use super::aggregator::aggregate;
use super::command::LaunchSpec;
use crate::cli::Cli;
use crate::process::spawn_lines;
use crate::tracing::{ErrorTraceExt, ResultTraceExt};
use crate::types::{BridgeConfig, BridgeError, BridgeReport, BridgeRequest};

// OpenTelemetry imports (only when feature is enabled)
#[cfg(feature = "otel")]
use opentelemetry::global;
#[cfg(feature = "otel")]
use opentelemetry::trace::TracerProvider;
#[cfg(feature = "otel")]
use opentelemetry_otlp::WithExportConfig;
#[cfg(feature = "otel")]
use opentelemetry_sdk::trace::SdkTracerProvider;

// Global storage for OpenTelemetry provider (for proper shutdown)
#[cfg(feature = "otel")]
static OTEL_PROVIDER: std::sync::OnceLock<SdkTracerProvider> = std::sync::OnceLock::new();

/// Shutdown OpenTelemetry provider (flush all pending spans)
///
/// This should be called before the application exits to ensure all
/// telemetry data is properly flushed to the backend.
#[cfg(feature = "otel")]
pub fn shutdown_otel() {
    if let Some(provider) = OTEL_PROVIDER.get() {
        tracing::debug!("Shutting down OpenTelemetry provider...");
        if let Err(e) = provider.shutdown() {
            eprintln!("Failed to shutdown OpenTelemetry provider: {:?}", e);
        }
    }
}

/// Shutdown OpenTelemetry provider (no-op when feature is disabled)
#[cfg(not(feature = "otel"))]
pub fn shutdown_otel() {}

#[cfg(feature = "otel")]
fn init_otel(endpoint: &str, service_name: &str) -> anyhow::Result<SdkTracerProvider> {
    use opentelemetry_sdk::Resource;

    let exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_tonic()
        .with_endpoint(endpoint)
        .build()?;

    let provider = SdkTracerProvider::builder()
        .with_batch_exporter(exporter)
        .with_resource(
            Resource::builder()
                .with_service_name(service_name.to_owned())
                .build(),
        )
        .build();

    global::set_tracer_provider(provider.clone());

    Ok(provider)
}

/// Build an EnvFilter based on CLI args and RUST_LOG environment variable
///
/// Priority: RUST_LOG environment variable > CLI arguments (-v, -vv, -q)
fn build_env_filter(cli: &Cli) -> tracing_subscriber::EnvFilter {
    if let Ok(rust_log) = std::env::var("RUST_LOG") {
        if !rust_log.is_empty() {
            return tracing_subscriber::EnvFilter::new(rust_log);
        }
    }

    let level = cli.log_level();
    tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into())
}

/// Install the subscriber with the given writer, adding the OTLP layer when configured
fn install_subscriber<W>(cli: &Cli, writer: W) -> anyhow::Result<()>
where
    W: for<'w> tracing_subscriber::fmt::MakeWriter<'w> + Send + Sync + 'static,
{
    let filter = build_env_filter(cli);
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(writer)
        .with_ansi(false);

    #[cfg(feature = "otel")]
    {
        if let Some(endpoint) = cli.otel_endpoint.as_deref() {
            let service_name = &cli.otel_service_name;

            eprintln!(
                "OpenTelemetry enabled: endpoint={}, service={}",
                endpoint, service_name
            );

            let provider = init_otel(endpoint, service_name)?;
            let tracer = provider.tracer("gemini-bridge");
            let otel_layer = tracing_opentelemetry::layer().with_tracer(tracer);

            drop(OTEL_PROVIDER.set(provider));

            tracing_subscriber::registry()
                .with(filter)
                .with(fmt_layer)
                .with(otel_layer)
                .try_init()?;
            return Ok(());
        }
    }

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init()?;
    Ok(())
}

/// Initialize logging with file output (diagnostic mode)
fn init_logging_to_file(cli: &Cli) -> anyhow::Result<()> {
    let log_path = cli.log_path();

    if let Some(parent) = log_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let file = std::fs::File::create(&log_path)?;

    // stdout is reserved for the report
    eprintln!("Diagnostic mode: logging to {}", log_path.display());

    install_subscriber(cli, std::sync::Mutex::new(file))
}

/// Initialize logging based on CLI arguments
fn init_logging(cli: &Cli) -> anyhow::Result<()> {
    if cli.is_diagnostic() {
        init_logging_to_file(cli)
    } else {
        install_subscriber(cli, std::io::stderr)
    }
}

/// Run one gemini turn and build the report
///
/// Never fails: every problem, including a missing workspace or a CLI that
/// cannot be launched, ends up in the report.
#[tracing::instrument(name = "bridge_run", skip_all, fields(
    workspace = %request.workspace.display(),
    resume = request.session_id.is_some(),
    sandbox = request.sandbox,
))]
pub async fn run_bridge(request: &BridgeRequest, config: &BridgeConfig) -> BridgeReport {
    let started = std::time::Instant::now();

    if !request.workspace.exists() {
        BridgeError::workspace_not_found(&request.workspace).trace_error();
        return BridgeReport::workspace_missing(&request.workspace);
    }

    let spec = LaunchSpec::for_request(request, config);
    tracing::debug!(
        program = %spec.program.display(),
        args = ?spec.args,
        "Launching gemini"
    );

    let lines = match spawn_lines(&spec, config) {
        Ok(lines) => lines,
        Err(e) => {
            e.trace_error();
            return BridgeReport::launch_failed(&e);
        }
    };

    let report = aggregate(lines, request.return_all_messages).await;

    tracing::info!(
        success = report.success,
        session_id = %report.session_id.as_ref().map(ToString::to_string).unwrap_or_default(),
        reply_len = report.agent_messages.as_ref().map_or(0, String::len),
        elapsed_ms = started.elapsed().as_millis(),
        "Bridge run finished"
    );

    report
}

/// Run the bridge with CLI arguments
///
/// Initializes logging, reads the environment configuration, runs the turn
/// and writes the report to stdout.
pub async fn run_with_cli(cli: &Cli) -> anyhow::Result<()> {
    init_logging(cli)?;

    tracing::debug!(
        version = %env!("CARGO_PKG_VERSION"),
        pid = %std::process::id(),
        diagnostic = cli.is_diagnostic(),
        otel_enabled = cli.is_otel_enabled(),
        "gemini-bridge starting"
    );

    let config = BridgeConfig::from_env();
    tracing::debug!(?config, "Loaded configuration");

    let request = cli.to_request();
    let report = run_bridge(&request, &config).await;

    let rendered = report.to_json_pretty()?;
    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{rendered}").trace_context()?;
    stdout.flush().trace_context()?;

    Ok(())
}
