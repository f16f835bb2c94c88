//! `simulate` command implementation.
//!
//! Builds an in-memory page, installs the dispatcher and drives virtual time
//! until the roster has run, then settles every script load.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Serialize;
use tokio::time::Instant;
use tracing::{debug, info};

use contracts::{LoaderConfig, SharedHost};
use dispatcher::{DeferredDispatcher, DispatchReport, DispatchSnapshot, DispatcherConfig};
use page_sim::{LoadOutcome, LoadRecord, PageOptions, SimulatedPage};

use super::load_config;
use crate::cli::{Interaction, SimulateArgs};
use crate::error::CliError;

/// Virtual-time resolution while waiting for the fallback timer
const TICK: Duration = Duration::from_millis(10);

/// Outcome of one simulated page visit
#[derive(Debug, Serialize)]
pub struct SimulationReport {
    /// Virtual time at which dispatch was observed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dispatched_at_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dispatch: Option<DispatchReport>,
    pub metrics: DispatchSnapshot,
    pub loads: Vec<LoadRecord>,
    pub listeners_remaining: usize,
    pub timers_remaining: usize,
    pub html: String,
}

/// Execute the `simulate` command
pub async fn run_simulate(args: &SimulateArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration");
    let config = load_config(&args.config)?;

    let prometheus = if args.metrics {
        Some(observability::init_metrics_only()?)
    } else {
        None
    };

    let report = simulate(&config, args).await?;

    if args.json {
        let json = serde_json::to_string_pretty(&report)
            .context("Failed to serialize simulation report")?;
        println!("{}", json);
    } else {
        print_report(&report);
    }

    if let Some(handle) = prometheus {
        println!("\n{}", handle.render());
    }

    Ok(())
}

/// Run one page visit on virtual time
///
/// Must run on a runtime whose clock is paused.
pub async fn simulate(config: &LoaderConfig, args: &SimulateArgs) -> Result<SimulationReport> {
    let page = Arc::new(SimulatedPage::with_options(PageOptions {
        idle_support: !args.no_idle,
        idle_latency: Duration::from_millis(args.idle_latency_ms),
        fail_sources: args.fail_sources.clone(),
        ..PageOptions::default()
    }));
    let host: SharedHost = page.clone();

    let roster = vendors::build_roster(config, Arc::clone(&host));
    let dispatcher =
        DeferredDispatcher::new(host, DispatcherConfig::from_loader(config), roster)
            .map_err(|e| CliError::simulation(e.to_string()))?;

    let start = Instant::now();
    dispatcher
        .install()
        .map_err(|e| CliError::simulation(e.to_string()))?;
    page_sim::settle().await;

    let mut interactions: Vec<Interaction> = args.interactions.clone();
    interactions.sort_by_key(|i| i.at);

    let mut dispatched_at = None;
    let mut index = 0;
    while index < interactions.len() {
        let at = interactions[index].at;
        tokio::time::sleep_until(start + at).await;
        page_sim::settle().await;
        observe(&dispatcher, start, &mut dispatched_at);

        // Events sharing an offset are queued in the same task turn
        let batch: Vec<_> = interactions[index..]
            .iter()
            .take_while(|i| i.at == at)
            .map(|i| i.kind)
            .collect();
        index += batch.len();
        debug!(at_ms = at.as_millis() as u64, events = ?batch, "Delivering interactions");
        page.dispatch_events(&batch);
        observe(&dispatcher, start, &mut dispatched_at);
    }

    let limit = config.delay() + config.idle_timeout() + TICK;
    while !dispatcher.is_fired() && start.elapsed() < limit {
        page_sim::run_for(TICK).await;
        observe(&dispatcher, start, &mut dispatched_at);
    }

    let loads = page.settle_loads();
    page_sim::settle().await;

    Ok(SimulationReport {
        dispatched_at_ms: dispatched_at.map(|d: Duration| d.as_millis() as u64),
        dispatch: dispatcher.report(),
        metrics: dispatcher.metrics(),
        loads,
        listeners_remaining: page.listener_count(),
        timers_remaining: page.pending_timer_count(),
        html: page.render_html(),
    })
}

fn observe(dispatcher: &DeferredDispatcher, start: Instant, dispatched_at: &mut Option<Duration>) {
    if dispatched_at.is_none() && dispatcher.is_fired() {
        *dispatched_at = Some(start.elapsed());
    }
}

fn print_report(report: &SimulationReport) {
    match (&report.dispatch, report.dispatched_at_ms) {
        (Some(dispatch), Some(at)) => {
            println!("✓ Dispatched by {} at {} ms", dispatch.source, at);
            println!("\n  Ran ({}):", dispatch.ran.len());
            for name in &dispatch.ran {
                println!("    - {}", name);
            }
            if !dispatch.skipped.is_empty() {
                println!("  Skipped: {}", dispatch.skipped.len());
            }
            if !dispatch.failed.is_empty() {
                println!("\n⚠ Failed:");
                for failed in &dispatch.failed {
                    println!("    - {}: {}", failed.name, failed.message);
                }
            }
        }
        _ => println!("✗ Nothing dispatched"),
    }

    println!(
        "\n  Triggers received: {} (absorbed {}, ignored {})",
        report.metrics.triggers_received,
        report.metrics.triggers_absorbed,
        report.metrics.triggers_ignored
    );
    println!(
        "  Listeners remaining: {}, timers remaining: {}",
        report.listeners_remaining, report.timers_remaining
    );

    if !report.loads.is_empty() {
        println!("\n📜 Script loads ({}):", report.loads.len());
        for load in &report.loads {
            let mark = match load.outcome {
                LoadOutcome::Loaded => "✓",
                LoadOutcome::Failed => "✗",
            };
            println!("    {} {}", mark, load.src);
        }
    }

    println!("\n{}", report.html);
}
