//! Effective configuration command handler.

use std::path::Path;

use anyhow::{Context, Result};

use rescache::{CacheFamily, RescacheConfig};

/// Handle `rescache config`.
pub(crate) fn cmd_config(path_only: bool, file: Option<&Path>) -> Result<()> {
    if path_only {
        let path = file.map(Path::to_path_buf).unwrap_or_else(RescacheConfig::path);
        println!("{}", path.display());
        return Ok(());
    }

    let config = load(file)?;
    let warnings = config.validate().context("Invalid configuration")?;
    print!("{}", render_settings(&config));

    if !warnings.is_empty() {
        println!();
        for warning in warnings {
            println!("warning: {}", warning);
        }
    }
    Ok(())
}

fn load(file: Option<&Path>) -> Result<RescacheConfig> {
    match file {
        Some(path) => {
            let mut config = RescacheConfig::load_from_path(path)
                .with_context(|| format!("Failed to load {}", path.display()))?;
            config.apply_env_overrides();
            Ok(config)
        }
        None => RescacheConfig::load().context("Failed to load configuration"),
    }
}

fn render_settings(config: &RescacheConfig) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{:<26} {:<12} {:<10}\n",
        "Cache", "TTL (s)", "Max size"
    ));
    out.push_str(&format!("{}\n", "-".repeat(50)));
    for family in CacheFamily::ALL {
        let settings = config.settings(family);
        let size = if settings.is_pass_through() {
            format!("{} (pass-through)", settings.max_size)
        } else {
            settings.max_size.to_string()
        };
        out.push_str(&format!(
            "{:<26} {:<12} {:<10}\n",
            family.name(),
            settings.ttl_secs,
            size
        ));
    }

    out.push('\n');
    match config.reaper.interval() {
        Some(interval) => out.push_str(&format!("Reaper:     every {}s\n", interval.as_secs())),
        None => out.push_str("Reaper:     disabled (expiry on lookup)\n"),
    }
    out.push_str(&format!("Monitor:    http://{}\n", config.monitor.addr()));
    out.push_str(&format!(
        "Admin auth: {}\n",
        if config.monitor.admin_token.is_some() {
            "bearer token"
        } else {
            "none"
        }
    ));
    out
}
