//! `validate` command implementation.

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use contracts::LoaderConfig;

use super::preview_roster;
use crate::cli::ValidateArgs;

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    config_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warnings: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ConfigSummary>,
}

#[derive(Serialize)]
struct ConfigSummary {
    version: String,
    debug: bool,
    delay_timeout_ms: u64,
    idle_timeout_ms: u64,
    triggers: Vec<String>,
    enabled_entries: usize,
    total_entries: usize,
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!(config = %args.config.display(), "Validating configuration");

    let result = validate_config(args);

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{}", json);
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        anyhow::bail!("Configuration validation failed")
    }
}

fn validate_config(args: &ValidateArgs) -> ValidationResult {
    let config_path = args.config.display().to_string();

    if !args.config.exists() {
        return ValidationResult {
            valid: false,
            config_path,
            error: Some(format!("File not found: {}", args.config.display())),
            warnings: None,
            summary: None,
        };
    }

    match config_loader::ConfigLoader::load_from_path(&args.config) {
        Ok(config) => {
            let roster = preview_roster(&config);
            let enabled_entries = roster.entries().iter().filter(|e| e.is_enabled()).count();
            let warnings = collect_warnings(&config, enabled_entries);

            ValidationResult {
                valid: true,
                config_path,
                error: None,
                warnings: if warnings.is_empty() {
                    None
                } else {
                    Some(warnings)
                },
                summary: Some(ConfigSummary {
                    version: format!("{:?}", config.version),
                    debug: config.debug,
                    delay_timeout_ms: config.delay_timeout_ms,
                    idle_timeout_ms: config.idle_timeout_ms,
                    triggers: config.triggers.iter().map(ToString::to_string).collect(),
                    enabled_entries,
                    total_entries: roster.len(),
                }),
            }
        }
        Err(e) => ValidationResult {
            valid: false,
            config_path,
            error: Some(e.to_string()),
            warnings: None,
            summary: None,
        },
    }
}

/// Collect configuration warnings (non-fatal issues)
fn collect_warnings(config: &LoaderConfig, enabled_entries: usize) -> Vec<String> {
    let mut warnings = Vec::new();
    let analytics = &config.analytics;

    if enabled_entries == 0 {
        warnings.push("No integrations enabled - dispatch will inject nothing".to_string());
    }

    if config.triggers.is_empty() {
        warnings.push("No triggers configured - only the fallback timer can dispatch".to_string());
    }

    if !analytics.call_metrics_id.is_empty()
        && analytics.call_metrics_phones.iter().all(String::is_empty)
    {
        warnings.push("analytics.call_metrics_id is set but no phone numbers are".to_string());
    }

    if analytics.google_analytics_id.is_empty() {
        for (field, value) in [
            ("google_ads_id", &analytics.google_ads_id),
            ("call_metrics_id", &analytics.call_metrics_id),
            ("lead_conversion_id", &analytics.lead_conversion_id),
        ] {
            if !value.is_empty() {
                warnings.push(format!(
                    "analytics.{field} is ignored without analytics.google_analytics_id"
                ));
            }
        }
    }

    if config.userway.enabled && config.userway.account.is_empty() {
        warnings.push("userway.enabled is set but userway.account is empty".to_string());
    }

    for script in config.custom_scripts.iter().filter(|s| !s.enabled) {
        warnings.push(format!("Custom script '{}' is disabled", script.name));
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Configuration is valid: {}", result.config_path);

        if let Some(ref summary) = result.summary {
            println!("\n  Version: {}", summary.version);
            println!("  Debug: {}", summary.debug);
            println!("  Fallback delay: {} ms", summary.delay_timeout_ms);
            println!("  Idle timeout: {} ms", summary.idle_timeout_ms);
            println!("  Triggers: {}", summary.triggers.join(", "));
            println!(
                "  Integrations: {} of {} enabled",
                summary.enabled_entries, summary.total_entries
            );
        }

        if let Some(ref warnings) = result.warnings {
            println!("\n⚠ Warnings:");
            for warning in warnings {
                println!("  - {}", warning);
            }
        }
    } else {
        println!("✗ Configuration is invalid: {}", result.config_path);
        if let Some(ref error) = result.error {
            println!("\n  Error: {}", error);
        }
    }
}
