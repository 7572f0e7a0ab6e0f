//! Configuration for rescache.
//!
//! Loaded from `~/.rescache/config.json` (or `.toml`) when present, then
//! overridden from the environment:
//!
//! - `RESCACHE_<FAMILY>_TTL_SECS`, `RESCACHE_<FAMILY>_MAX_SIZE` where
//!   `<FAMILY>` is `EMBEDDING`, `VECTOR_PROCESSOR`, `RERANK_MODEL` or
//!   `WEIGHT_RERANK_EMBEDDING`
//! - `RESCACHE_REAPER_INTERVAL_SECS` (0 disables the reaper)
//! - `RESCACHE_MONITOR_HOST`, `RESCACHE_MONITOR_PORT`, `RESCACHE_ADMIN_TOKEN`
//! - `RESCACHE_STATS_LOG_INTERVAL_SECS` (0 disables the periodic stats log)

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{CacheError, Result};
use crate::resources::CacheFamily;

/// Resolved settings of one cache instance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CacheSettings {
    /// Seconds before an entry is treated as stale.
    pub ttl_secs: f64,
    /// Maximum resident entries. Zero or negative means pass-through.
    pub max_size: i64,
}

impl CacheSettings {
    pub fn new(ttl_secs: f64, max_size: i64) -> Self {
        Self { ttl_secs, max_size }
    }

    /// TTL as a `Duration`. Rejects negative, NaN and infinite values.
    pub fn ttl(&self) -> Result<Duration> {
        Duration::try_from_secs_f64(self.ttl_secs).map_err(|_| {
            CacheError::Config(format!(
                "ttl_secs must be a finite, non-negative number of seconds (got {})",
                self.ttl_secs
            ))
        })
    }

    /// Capacity with non-positive sizes clamped to zero (pass-through).
    pub fn capacity(&self) -> usize {
        usize::try_from(self.max_size).unwrap_or(0)
    }

    pub fn is_pass_through(&self) -> bool {
        self.max_size <= 0
    }
}

/// Per-family overrides as written in the config file.
///
/// Unset fields fall back to the family's own defaults, so a partial section
/// like `{"ttl_secs": 60}` keeps the family's default size.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ttl_secs: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_size: Option<i64>,
}

impl CacheOverrides {
    pub fn resolve(&self, defaults: CacheSettings) -> CacheSettings {
        CacheSettings {
            ttl_secs: self.ttl_secs.unwrap_or(defaults.ttl_secs),
            max_size: self.max_size.unwrap_or(defaults.max_size),
        }
    }
}

/// One override section per resource family.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CachesConfig {
    pub embedding: CacheOverrides,
    pub vector_processor: CacheOverrides,
    pub rerank_model: CacheOverrides,
    pub weight_rerank_embedding: CacheOverrides,
}

impl CachesConfig {
    pub fn overrides(&self, family: CacheFamily) -> &CacheOverrides {
        match family {
            CacheFamily::Embedding => &self.embedding,
            CacheFamily::VectorProcessor => &self.vector_processor,
            CacheFamily::RerankModel => &self.rerank_model,
            CacheFamily::WeightRerankEmbedding => &self.weight_rerank_embedding,
        }
    }

    fn overrides_mut(&mut self, family: CacheFamily) -> &mut CacheOverrides {
        match family {
            CacheFamily::Embedding => &mut self.embedding,
            CacheFamily::VectorProcessor => &mut self.vector_processor,
            CacheFamily::RerankModel => &mut self.rerank_model,
            CacheFamily::WeightRerankEmbedding => &mut self.weight_rerank_embedding,
        }
    }
}

/// Background purge of expired entries.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReaperConfig {
    /// Seconds between purges. 0 disables the reaper (expiry stays lazy).
    pub interval_secs: u64,
}

impl ReaperConfig {
    pub fn interval(&self) -> Option<Duration> {
        (self.interval_secs > 0).then(|| Duration::from_secs(self.interval_secs))
    }
}

/// Operator endpoint and reporting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Bind address (default: 127.0.0.1).
    pub host: String,
    pub port: u16,
    /// Bearer token required by `/admin/*` routes. `None` leaves them open,
    /// which is only sensible on a loopback bind.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub admin_token: Option<String>,
    /// Seconds between stats summary log lines. 0 disables them.
    pub stats_log_interval_secs: u64,
    /// Estimated cost of building a resource with no cache at all.
    pub cold_start_secs: f64,
    /// Estimated cost of a construction on a cache miss.
    pub miss_secs: f64,
    /// Estimated cost of a cache hit.
    pub hit_secs: f64,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 9190,
            admin_token: None,
            stats_log_interval_secs: 0,
            cold_start_secs: 15.0,
            miss_secs: 2.06,
            hit_secs: 0.0001,
        }
    }
}

impl MonitorConfig {
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn stats_log_interval(&self) -> Option<Duration> {
        (self.stats_log_interval_secs > 0).then(|| Duration::from_secs(self.stats_log_interval_secs))
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RescacheConfig {
    pub caches: CachesConfig,
    pub reaper: ReaperConfig,
    pub monitor: MonitorConfig,
}

impl RescacheConfig {
    /// Config directory (`~/.rescache`).
    pub fn dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".rescache")
    }

    /// Default config file path.
    pub fn path() -> PathBuf {
        Self::dir().join("config.json")
    }

    /// Load `.env`, the default config file if it exists, then environment
    /// overrides, and validate.
    pub fn load() -> Result<Self> {
        let _ = dotenvy::dotenv();
        let path = Self::path();
        let mut config = if path.exists() {
            Self::load_from_path(&path)?
        } else {
            debug!(path = %path.display(), "No config file, using defaults");
            Self::default()
        };
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Parse a config file; `.toml` files as TOML, everything else as JSON.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let is_toml = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));
        if is_toml {
            Ok(toml::from_str(&content)?)
        } else {
            Ok(serde_json::from_str(&content)?)
        }
    }

    /// Apply `RESCACHE_*` variables from the process environment.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|name| std::env::var(name).ok());
    }

    /// Apply overrides from an arbitrary variable source.
    ///
    /// Unparseable values are logged and ignored.
    pub fn apply_overrides_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        for family in CacheFamily::ALL {
            let prefix = family.env_prefix();
            let overrides = self.caches.overrides_mut(family);
            if let Some(ttl) = parse_var::<f64, _>(&lookup, &format!("{prefix}_TTL_SECS")) {
                overrides.ttl_secs = Some(ttl);
            }
            if let Some(size) = parse_var::<i64, _>(&lookup, &format!("{prefix}_MAX_SIZE")) {
                overrides.max_size = Some(size);
            }
        }
        if let Some(secs) = parse_var::<u64, _>(&lookup, "RESCACHE_REAPER_INTERVAL_SECS") {
            self.reaper.interval_secs = secs;
        }
        if let Some(host) = lookup("RESCACHE_MONITOR_HOST") {
            self.monitor.host = host;
        }
        if let Some(port) = parse_var::<u16, _>(&lookup, "RESCACHE_MONITOR_PORT") {
            self.monitor.port = port;
        }
        if let Some(token) = lookup("RESCACHE_ADMIN_TOKEN").filter(|t| !t.is_empty()) {
            self.monitor.admin_token = Some(token);
        }
        if let Some(secs) = parse_var::<u64, _>(&lookup, "RESCACHE_STATS_LOG_INTERVAL_SECS") {
            self.monitor.stats_log_interval_secs = secs;
        }
    }

    /// Resolved settings for one family.
    pub fn settings(&self, family: CacheFamily) -> CacheSettings {
        self.caches.overrides(family).resolve(family.default_settings())
    }

    /// Reject unusable values; return warnings for values that only degrade
    /// behaviour (non-positive sizes become pass-through caches).
    pub fn validate(&self) -> Result<Vec<String>> {
        let mut warnings = Vec::new();
        for family in CacheFamily::ALL {
            let settings = self.settings(family);
            settings
                .ttl()
                .map_err(|e| CacheError::Config(format!("{}: {}", family.name(), e)))?;
            if settings.is_pass_through() {
                let msg = format!(
                    "{}: max_size {} disables retention; cache acts as a pass-through",
                    family.name(),
                    settings.max_size
                );
                warn!("{}", msg);
                warnings.push(msg);
            }
        }
        if self.monitor.admin_token.is_none() && !is_loopback(&self.monitor.host) {
            let msg = format!(
                "monitor bound to {} without an admin token; /admin routes are open",
                self.monitor.host
            );
            warn!("{}", msg);
            warnings.push(msg);
        }
        Ok(warnings)
    }
}

fn parse_var<T, F>(lookup: &F, name: &str) -> Option<T>
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    let raw = lookup(name)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!(var = name, value = %raw, "Ignoring unparseable environment override");
            None
        }
    }
}

fn is_loopback(host: &str) -> bool {
    matches!(host, "127.0.0.1" | "localhost" | "::1")
}
