//! `cadence limits` handler.

use super::OutputFormat;
use cadence::{LimiterConfig, normalize_model_key};

/// Print the limits for `model`, or the whole configuration.
pub fn show_limits(
    config: &LimiterConfig,
    model: Option<&str>,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    match (model, format) {
        (Some(model), OutputFormat::Json) => {
            let limits = config.limits_for(model);
            println!("{}", serde_json::to_string_pretty(&limits)?);
        }
        (Some(model), OutputFormat::Human) => {
            let key = normalize_model_key(model);
            let limits = config.limits_for(model);
            let source = if config.models.contains_key(&key) {
                "configured"
            } else {
                "default"
            };
            println!("{key} ({source})");
            println!("  rpm: {}", limits.rpm);
            println!("  tpm: {}", limits.tpm);
            println!("  rpd: {}", limits.rpd);
        }
        (None, OutputFormat::Json) => {
            println!("{}", serde_json::to_string_pretty(config)?);
        }
        (None, OutputFormat::Human) => {
            println!("default model:   {}", config.default_model);
            println!("fallback models: {}", config.fallback_models.join(", "));
            println!("cooldown:        {} min", config.cooldown_minutes);
            println!(
                "max entries:     {} ({})",
                config.max_entries, config.eviction_policy
            );
            println!();
            println!("{:<28} {:>6} {:>12} {:>8}", "MODEL", "RPM", "TPM", "RPD");

            let mut models: Vec<_> = config.models.iter().collect();
            models.sort_by(|a, b| a.0.cmp(b.0));
            for (name, limits) in models {
                println!(
                    "{:<28} {:>6} {:>12} {:>8}",
                    name, limits.rpm, limits.tpm, limits.rpd
                );
            }
            let d = config.default_limits;
            println!("{:<28} {:>6} {:>12} {:>8}", "(default)", d.rpm, d.tpm, d.rpd);
        }
    }
    Ok(())
}
