//! `info` command implementation.

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use contracts::{LoaderConfig, Roster};

use super::{load_config, preview_roster};
use crate::cli::InfoArgs;

/// Configuration info for JSON output
#[derive(Serialize)]
struct ConfigInfo {
    version: String,
    debug: bool,
    timing: TimingInfo,
    triggers: Vec<String>,
    roster: Vec<EntryInfo>,
}

#[derive(Serialize)]
struct TimingInfo {
    delay_timeout_ms: u64,
    idle_timeout_ms: u64,
}

#[derive(Serialize)]
struct EntryInfo {
    name: String,
    enabled: bool,
}

/// Execute the `info` command
pub fn run_info(args: &InfoArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration info");

    let config = load_config(&args.config)?;
    let roster = preview_roster(&config);
    let info = build_config_info(&config, &roster);

    if args.json {
        let json =
            serde_json::to_string_pretty(&info).context("Failed to serialize config info")?;
        println!("{}", json);
    } else {
        print_config_info(&info);
    }

    Ok(())
}

fn build_config_info(config: &LoaderConfig, roster: &Roster) -> ConfigInfo {
    ConfigInfo {
        version: format!("{:?}", config.version),
        debug: config.debug,
        timing: TimingInfo {
            delay_timeout_ms: config.delay_timeout_ms,
            idle_timeout_ms: config.idle_timeout_ms,
        },
        triggers: config.triggers.iter().map(ToString::to_string).collect(),
        roster: roster
            .entries()
            .iter()
            .map(|entry| EntryInfo {
                name: entry.name().to_string(),
                enabled: entry.is_enabled(),
            })
            .collect(),
    }
}

fn print_config_info(info: &ConfigInfo) {
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║               Snippet Loader Configuration                   ║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");

    println!("⏱  Timing");
    println!("   ├─ Version: {}", info.version);
    println!("   ├─ Debug: {}", info.debug);
    println!("   ├─ Fallback delay: {} ms", info.timing.delay_timeout_ms);
    println!("   └─ Idle timeout: {} ms", info.timing.idle_timeout_ms);

    println!("\n👆 Triggers ({})", info.triggers.len());
    for (i, trigger) in info.triggers.iter().enumerate() {
        let prefix = if i == info.triggers.len() - 1 { "└─" } else { "├─" };
        println!("   {} {}", prefix, trigger);
    }

    let enabled = info.roster.iter().filter(|e| e.enabled).count();
    println!("\n📦 Roster ({} of {} enabled)", enabled, info.roster.len());
    for (i, entry) in info.roster.iter().enumerate() {
        let prefix = if i == info.roster.len() - 1 { "└─" } else { "├─" };
        let mark = if entry.enabled { "✓" } else { "·" };
        println!("   {} {} {}", prefix, mark, entry.name);
    }

    println!();
}
