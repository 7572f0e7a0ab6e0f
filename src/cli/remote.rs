//! Command handlers that query a running monitor endpoint.

use std::time::Duration;

use anyhow::{bail, Context, Result};
use reqwest::{Client, Method, StatusCode};

use rescache::monitor::{PerformanceReport, StatsReport};
use rescache::RescacheConfig;

use super::RemoteArgs;

const REQUEST_TIMEOUT_SECS: u64 = 10;

/// Resolved monitor endpoint plus the admin token to present.
struct Remote {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl Remote {
    fn new(args: &RemoteArgs, token: Option<String>) -> Result<Self> {
        let (addr, configured_token) = match &args.addr {
            Some(addr) => (addr.clone(), None),
            None => {
                let config = RescacheConfig::load().context("Failed to load configuration")?;
                (config.monitor.addr(), config.monitor.admin_token)
            }
        };
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            client,
            base_url: base_url(&addr),
            token: token.or(configured_token),
        })
    }

    async fn send(&self, method: Method, path: &str) -> Result<String> {
        let url = format!("{}{}", self.base_url, path);
        let mut request = self.client.request(method, &url);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        let response = request
            .send()
            .await
            .with_context(|| format!("Monitor unreachable at {}", self.base_url))?;
        let status = response.status();
        let body = response.text().await.context("Failed to read monitor response")?;
        if status == StatusCode::UNAUTHORIZED {
            bail!("Monitor rejected the admin token (use --token)");
        }
        if status == StatusCode::NOT_FOUND && path.contains("cache=") {
            bail!("Unknown cache: {}", body);
        }
        if !status.is_success() {
            bail!("Monitor returned {}: {}", status, body);
        }
        Ok(body)
    }
}

fn base_url(addr: &str) -> String {
    let addr = addr.trim_end_matches('/');
    if addr.starts_with("http://") || addr.starts_with("https://") {
        addr.to_string()
    } else {
        format!("http://{}", addr)
    }
}

/// Handle `rescache stats`.
pub(crate) async fn cmd_stats(args: &RemoteArgs, json: bool) -> Result<()> {
    let body = Remote::new(args, None)?.send(Method::GET, "/stats").await?;
    if json {
        println!("{}", body);
        return Ok(());
    }
    let report: StatsReport = serde_json::from_str(&body).context("Malformed /stats response")?;
    print!("{}", render_stats(&report));
    Ok(())
}

/// Handle `rescache metrics`.
pub(crate) async fn cmd_metrics(args: &RemoteArgs) -> Result<()> {
    let body = Remote::new(args, None)?.send(Method::GET, "/metrics").await?;
    print!("{}", body);
    Ok(())
}

/// Handle `rescache report`.
pub(crate) async fn cmd_report(args: &RemoteArgs, json: bool) -> Result<()> {
    let body = Remote::new(args, None)?.send(Method::GET, "/report").await?;
    if json {
        println!("{}", body);
        return Ok(());
    }
    let report: PerformanceReport =
        serde_json::from_str(&body).context("Malformed /report response")?;
    print!("{}", report.render_text());
    Ok(())
}

/// Handle `rescache clear`.
pub(crate) async fn cmd_clear(
    args: &RemoteArgs,
    stats_only: bool,
    cache: Option<&str>,
    token: Option<String>,
) -> Result<()> {
    let path = clear_path(stats_only, cache);
    Remote::new(args, token)?.send(Method::POST, &path).await?;
    let what = if stats_only { "statistics" } else { "entries" };
    match cache {
        Some(name) => println!("Cleared {} of cache: {}", what, name),
        None => println!("Cleared {} of all caches.", what),
    }
    Ok(())
}

fn clear_path(stats_only: bool, cache: Option<&str>) -> String {
    let route = if stats_only {
        "/admin/clear-stats"
    } else {
        "/admin/clear"
    };
    match cache {
        Some(name) => format!(
            "{}?cache={}",
            route,
            url::form_urlencoded::byte_serialize(name.as_bytes()).collect::<String>()
        ),
        None => route.to_string(),
    }
}

fn render_stats(report: &StatsReport) -> String {
    let mut out = String::new();
    if report.caches.is_empty() {
        out.push_str("No caches registered.\n");
        return out;
    }
    out.push_str(&format!(
        "{:<26} {:>9} {:>9} {:>9} {:>9} {:>9} {:>8}  {}\n",
        "Cache", "Size", "Hits", "Misses", "Evicted", "Expired", "Hit %", "Efficiency"
    ));
    out.push_str(&format!("{}\n", "-".repeat(108)));
    for view in &report.caches {
        let s = &view.stats;
        out.push_str(&format!(
            "{:<26} {:>9} {:>9} {:>9} {:>9} {:>9} {:>7.2}%  {}\n",
            s.name,
            format!("{}/{}", s.size, s.capacity),
            s.hits,
            s.misses,
            s.evictions,
            s.expired,
            view.hit_rate * 100.0,
            view.efficiency
        ));
    }
    out.push_str(&format!(
        "\nUptime: {}s ({:.1}h)\n",
        report.uptime_secs,
        report.uptime_secs as f64 / 3600.0
    ));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use rescache::cache::{CacheKey, ResourceCache};
    use rescache::monitor::{start_monitor_server, CostModel, MonitorState};
    use rescache::{CacheError, CacheRegistry, CacheStats};
    use std::sync::Arc;

    #[test]
    fn test_base_url() {
        assert_eq!(base_url("127.0.0.1:9190"), "http://127.0.0.1:9190");
        assert_eq!(base_url("http://monitor:80/"), "http://monitor:80");
    }

    #[test]
    fn test_clear_path() {
        assert_eq!(clear_path(false, None), "/admin/clear");
        assert_eq!(clear_path(true, Some("embedding")), "/admin/clear-stats?cache=embedding");
        assert_eq!(clear_path(false, Some("a b/c")), "/admin/clear?cache=a+b%2Fc");
    }

    #[test]
    fn test_render_stats() {
        let report = StatsReport {
            uptime_secs: 7200,
            caches: vec![CacheStats {
                name: "rerank_model".into(),
                hits: 19,
                misses: 1,
                size: 1,
                capacity: 50,
                ..Default::default()
            }
            .into()],
        };
        let text = render_stats(&report);
        assert!(text.contains("rerank_model"));
        assert!(text.contains("1/50"));
        assert!(text.contains("95.00%"));
        assert!(text.contains("Excellent (90%+)"));
        assert!(text.contains("(2.0h)"));

        let empty = StatsReport {
            uptime_secs: 0,
            caches: vec![],
        };
        assert_eq!(render_stats(&empty), "No caches registered.\n");
    }

    #[tokio::test]
    async fn test_commands_against_live_monitor() {
        let cache: ResourceCache<Arc<String>, CacheError> =
            ResourceCache::new("embedding", 10, Duration::from_secs(60));
        cache
            .get_or_create(&CacheKey::derive(["t", "openai", "m"]), || async {
                Ok(Arc::new("client".to_string()))
            })
            .await
            .unwrap();
        let registry = CacheRegistry::new();
        registry.register(Arc::new(cache.clone()));
        let state = MonitorState::new(registry, CostModel::default(), Some("tok"));
        let (addr, handle) = start_monitor_server("127.0.0.1", 0, state).await.unwrap();

        let args = RemoteArgs {
            addr: Some(addr.to_string()),
        };
        cmd_stats(&args, false).await.unwrap();
        cmd_metrics(&args).await.unwrap();
        cmd_report(&args, false).await.unwrap();

        assert!(cmd_clear(&args, false, None, Some("wrong".into())).await.is_err());
        assert_eq!(cache.len(), 1);
        cmd_clear(&args, false, Some("embedding"), Some("tok".into()))
            .await
            .unwrap();
        assert!(cache.is_empty());

        handle.abort();
    }
}
