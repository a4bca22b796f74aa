use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, bail};
use clap::Parser;
use tracing::info;

use equity_cli::config::ClientConfig;
use equity_cli::logging::init_logging;
use equity_cli::script::{self, ScriptLine, load_script, parse_script};
use equity_client::{EquitySession, HttpEstimator};
use equity_core::AppInfo;

/// Drive the card-placement state machine against a remote equity service.
#[derive(Debug, Parser)]
#[command(
    name = "equity",
    author,
    version,
    about = "Hold'em equity client: place cards, get win/lose/tie estimates"
)]
struct Cli {
    /// Path to the YAML configuration file.
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Override the service base URL (e.g. http://localhost:8080).
    #[arg(long, value_name = "URL")]
    endpoint: Option<String>,

    /// Override the number of simulation iterations per request.
    #[arg(long, value_name = "COUNT")]
    iterations: Option<u32>,

    /// Override the concurrency hint sent with each request.
    #[arg(long, value_name = "WORKERS")]
    concurrency: Option<u32>,

    /// Script file with one action per line.
    #[arg(short, long, value_name = "FILE")]
    script: Option<PathBuf>,

    /// Inline action, applied after the script (e.g. "select AS", "place player 0").
    #[arg(short, long = "action", value_name = "ACTION")]
    actions: Vec<String>,

    /// Check the service health endpoint and exit.
    #[arg(long)]
    health: bool,

    /// Exit after validating the configuration.
    #[arg(long)]
    validate_only: bool,

    /// Print the final summary as JSON.
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut config = match &cli.config {
        Some(path) => ClientConfig::from_path(path)?,
        None => ClientConfig::default(),
    };

    if let Some(endpoint) = cli.endpoint {
        config.endpoint.base_url = endpoint;
    }

    if let Some(iterations) = cli.iterations {
        config.simulation.iterations = iterations;
    }

    if let Some(concurrency) = cli.concurrency {
        config.simulation.concurrency = concurrency;
    }

    config.validate()?;

    let logging_guard = init_logging(&config.logging)?;
    info!(
        app = AppInfo::name(),
        version = AppInfo::version(),
        endpoint = %config.endpoint.simulation_url(),
        iterations = config.simulation.iterations,
        concurrency = config.simulation.concurrency,
        "configuration loaded"
    );

    if cli.validate_only {
        println!(
            "Configuration valid: {} ({} iterations, concurrency {})",
            config.endpoint.simulation_url(),
            config.simulation.iterations,
            config.simulation.concurrency
        );
        return Ok(());
    }

    let estimator = Arc::new(HttpEstimator::new(&config.endpoint)?);

    if cli.health {
        estimator
            .health()
            .await
            .with_context(|| format!("health check against {}", config.endpoint.health_url()))?;
        println!("{} is healthy", config.endpoint.base_url);
        return Ok(());
    }

    let mut lines: Vec<ScriptLine> = match &cli.script {
        Some(path) => load_script(path)?,
        None => Vec::new(),
    };
    let inline_start = lines.last().map_or(1, |line| line.line + 1);
    lines.extend(parse_script(&cli.actions.join("\n"), inline_start)?);
    if lines.is_empty() {
        bail!("nothing to do: pass --script FILE or one or more --action values");
    }

    let mut session = EquitySession::new(estimator, config.simulation);
    let stdout = io::stdout();
    let mut out = stdout.lock();
    let summary = script::run_script(&mut session, &lines, &mut out).await?;

    if cli.json {
        serde_json::to_writer_pretty(&mut out, &summary)?;
        writeln!(out)?;
    } else {
        writeln!(out, "{}", summary.state.render())?;
        writeln!(out, "{}", script::render_result(&summary.result))?;
        writeln!(
            out,
            "{} actions, {} requests, {} stale responses discarded",
            summary.actions_applied, summary.requests_dispatched, summary.stale_discarded
        )?;
        for failure in &summary.failures {
            writeln!(out, "failure: {failure}")?;
        }
    }

    if let Some(path) = logging_guard.log_path.as_ref() {
        eprintln!("Structured log: {}", path.display());
    }

    Ok(())
}
