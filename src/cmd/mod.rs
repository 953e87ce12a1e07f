use std::time::Instant;

use clap::Parser;
use tracing::{info, instrument, warn};

use crate::config::Config;
use crate::detect::collector::EvidenceCollector;
use crate::detect::{analyze, EvidenceSource, SuiteRegistry};
use crate::errors::Result;
use crate::notify::{build_payload, RunStats, SlackWebhook, WebhookSink};

/// CLI
#[derive(Parser, Debug)]
#[command(
    name = "sentinel-notify",
    version,
    about = "Detect which API test suite ran and notify the team channel.",
    long_about = "Detect which API test suite ran and notify the team channel.\n\
Suite detection weighs several evidence sources (executed-file listings, CLI\n\
arguments, spec filenames on disk, report content) against a suite registry\n\
and produces a confidence-ranked analysis.\n\n\
Resources:\n  • Registry: suite definitions (keywords, endpoint, display name), built in or loaded from YAML\n  • Artifacts: runner results JSON + HTML report, read best-effort\n  • Delivery: Slack-compatible webhook; --dry-run prints the payload instead"
)]
pub struct Cli {
    #[arg(long = "spec-dir", value_name = "DIR")]
    pub spec_dir: Option<String>,

    #[arg(long = "report", value_name = "FILE")]
    pub report: Option<String>,

    #[arg(long = "results", value_name = "FILE")]
    pub results: Option<String>,

    #[arg(long = "registry", short = 'r', value_name = "FILE")]
    pub registry: Option<String>,

    /// Print the payload instead of sending it.
    #[arg(long = "dry-run")]
    pub dry_run: bool,

    /// Extra tokens treated as CLI-argument evidence, typically the
    /// arguments the test runner was invoked with.
    #[arg(value_name = "TOKEN")]
    pub tokens: Vec<String>,
}

#[instrument(skip_all)]
pub async fn run_notify(cli: &Cli) -> Result<()> {
    info!("starting suite detection and notification");
    let t0 = Instant::now();

    let config = Config::from_env();

    // CLI paths win over environment config.
    let spec_dir = cli
        .spec_dir
        .clone()
        .unwrap_or_else(|| config.notify.spec_dir.clone());
    let report_path = cli
        .report
        .clone()
        .unwrap_or_else(|| config.notify.report_path.clone());
    let results_path = cli
        .results
        .clone()
        .unwrap_or_else(|| config.notify.results_path.clone());

    let registry = match &cli.registry {
        Some(path) => {
            let registry = SuiteRegistry::load_from_path(path)?;
            info!(suites = registry.len(), path = %path, "loaded suite registry");
            registry
        }
        None => SuiteRegistry::defaults(),
    };

    let collector = EvidenceCollector::new(&spec_dir, &report_path, &results_path)
        .with_cli_args(cli.tokens.clone());
    let evidence = collector.collect();
    info!(items = evidence.len(), "evidence collected");

    let analysis = analyze(&evidence, &registry);
    match &analysis.primary {
        Some(primary) => {
            let via: Vec<&str> = primary
                .origin_sources
                .iter()
                .map(EvidenceSource::label)
                .collect();
            info!(
                suite = %primary.name,
                confidence = primary.confidence,
                detections = primary.detection_count,
                via = %via.join(", "),
                "primary suite detected"
            );
        }
        None => warn!("could not determine which suite ran"),
    }
    if !analysis.suites.is_empty() {
        info!(suites = %analysis.suite_names().join(", "), "detected suites");
    }

    let stats = RunStats::from_results_path(&results_path).unwrap_or_default();
    info!(
        passed = stats.passed,
        failed = stats.failed,
        skipped = stats.skipped,
        total = stats.total,
        "run statistics"
    );

    let payload = build_payload(&stats, &analysis, &registry, &config.notify);

    if cli.dry_run {
        println!("{}", serde_json::to_string_pretty(&payload)?);
        info!(
            elapsed_ms = t0.elapsed().as_millis() as u64,
            "dry run complete"
        );
        return Ok(());
    }

    match &config.notify.webhook_url {
        Some(url) => {
            let sink = SlackWebhook::new(url);
            if let Err(err) = sink.post(&payload).await {
                // A lost notification must never fail the surrounding workflow.
                warn!(error = %err, "webhook delivery failed");
            }
        }
        None => {
            warn!("SLACK_WEBHOOK_URL not configured, skipping notification");
        }
    }

    info!(
        elapsed_ms = t0.elapsed().as_millis() as u64,
        "notification flow complete"
    );
    Ok(())
}
