//! Operator surface for the cache registry.
//!
//! - [`render_prometheus`] for the Prometheus text exposition format
//! - [`PerformanceReport`] for estimated construction time saved
//! - [`log_stats`] / [`start_periodic_stats_log`] for structured summaries
//! - [`start_monitor_server`] for the HTTP endpoint
//!
//! The endpoint speaks just enough HTTP/1.1 over raw TCP to serve a handful of
//! routes, one request per connection.

use std::fmt::Write as _;
use std::net::SocketAddr;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tracing::{debug, info, warn};

use crate::cache::CacheStats;
use crate::config::MonitorConfig;
use crate::error::Result;
use crate::registry::CacheRegistry;

const READ_TIMEOUT_SECS: u64 = 5;
const MAX_REQUEST_BYTES: usize = 4096;

// ============================================================================
// Prometheus exposition
// ============================================================================

/// Render one metric family per counter/gauge with a `cache` label per
/// instance.
pub fn render_prometheus(stats: &[CacheStats]) -> String {
    let mut out = String::new();
    let families: [(&str, &str, &str, fn(&CacheStats) -> String); 7] = [
        ("rescache_hits_total", "counter", "Lookups served from the cache", |s| {
            s.hits.to_string()
        }),
        ("rescache_misses_total", "counter", "Successful resource constructions", |s| {
            s.misses.to_string()
        }),
        ("rescache_evictions_total", "counter", "Entries evicted to stay within capacity", |s| {
            s.evictions.to_string()
        }),
        ("rescache_expired_total", "counter", "Entries dropped after outliving the TTL", |s| {
            s.expired.to_string()
        }),
        ("rescache_size", "gauge", "Resident entries", |s| s.size.to_string()),
        ("rescache_capacity", "gauge", "Configured capacity (0 = pass-through)", |s| {
            s.capacity.to_string()
        }),
        ("rescache_hit_rate", "gauge", "Hits over hits plus misses", |s| {
            format!("{:.4}", s.hit_rate())
        }),
    ];

    for (name, kind, help, value) in families {
        let _ = writeln!(out, "# HELP {name} {help}");
        let _ = writeln!(out, "# TYPE {name} {kind}");
        for s in stats {
            let _ = writeln!(out, "{name}{{cache=\"{}\"}} {}", escape_label(&s.name), value(s));
        }
    }
    out
}

fn escape_label(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
}

// ============================================================================
// Stats report
// ============================================================================

/// One cache's snapshot with its derived ratios, as served on `/stats`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheStatsView {
    #[serde(flatten)]
    pub stats: CacheStats,
    pub hit_rate: f64,
    pub efficiency: String,
}

impl From<CacheStats> for CacheStatsView {
    fn from(stats: CacheStats) -> Self {
        Self {
            hit_rate: stats.hit_rate(),
            efficiency: stats.efficiency().to_string(),
            stats,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatsReport {
    pub uptime_secs: u64,
    pub caches: Vec<CacheStatsView>,
}

impl StatsReport {
    pub fn from_registry(registry: &CacheRegistry) -> Self {
        Self {
            uptime_secs: registry.uptime().as_secs(),
            caches: registry.stats_all().into_iter().map(Into::into).collect(),
        }
    }
}

/// Emit one structured log line per cache.
pub fn log_stats(stats: &[CacheStats], reason: &str) {
    for s in stats {
        info!(
            event = "cache_stats",
            reason = reason,
            cache = %s.name,
            size = s.size,
            capacity = s.capacity,
            hits = s.hits,
            misses = s.misses,
            hit_rate = format!("{:.2}%", s.hit_rate() * 100.0),
            efficiency = %s.efficiency(),
            evictions = s.evictions,
            expired = s.expired,
            "Cache statistics"
        );
    }
}

/// Start a background task that logs every cache's stats each `interval`.
///
/// Emits a final `shutdown` summary when `shutdown_rx` signals `true`. A
/// zero `interval` disables the log: the returned task finishes immediately.
pub fn start_periodic_stats_log(
    registry: CacheRegistry,
    interval: Duration,
    mut shutdown_rx: tokio::sync::watch::Receiver<bool>,
) -> tokio::task::JoinHandle<()> {
    if interval.is_zero() {
        warn!("Stats log interval is zero; periodic stats log disabled");
        return tokio::spawn(async {});
    }
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.tick().await; // skip first immediate tick

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    log_stats(&registry.stats_all(), "periodic");
                }
                changed = shutdown_rx.changed() => {
                    if changed.is_err() || *shutdown_rx.borrow() {
                        log_stats(&registry.stats_all(), "shutdown");
                        break;
                    }
                }
            }
        }
    })
}

// ============================================================================
// Performance report
// ============================================================================

/// Estimated per-request construction costs, in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CostModel {
    /// Building a resource with no cache in front of it.
    pub cold_start_secs: f64,
    /// Building a resource on a cache miss.
    pub miss_secs: f64,
    /// Serving a resident entry.
    pub hit_secs: f64,
}

impl Default for CostModel {
    fn default() -> Self {
        Self {
            cold_start_secs: 15.0,
            miss_secs: 2.06,
            hit_secs: 0.0001,
        }
    }
}

impl From<&MonitorConfig> for CostModel {
    fn from(config: &MonitorConfig) -> Self {
        Self {
            cold_start_secs: config.cold_start_secs,
            miss_secs: config.miss_secs,
            hit_secs: config.hit_secs,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheSavings {
    pub name: String,
    pub requests: u64,
    pub time_without_cache_secs: f64,
    pub time_with_cache_secs: f64,
    pub time_saved_secs: f64,
}

impl CacheSavings {
    pub fn time_saved_hours(&self) -> f64 {
        self.time_saved_secs / 3600.0
    }
}

/// Estimated time saved by every cache since its counters were last reset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceReport {
    pub generated_at: DateTime<Utc>,
    pub uptime_secs: u64,
    pub cost_model: CostModel,
    pub caches: Vec<CacheSavings>,
    pub total_requests: u64,
    pub total_time_saved_secs: f64,
    pub total_time_saved_hours: f64,
    /// Uncached time over cached time across all caches.
    pub average_speedup: f64,
}

impl PerformanceReport {
    pub fn build(stats: &[CacheStats], cost: CostModel, uptime: Duration) -> Self {
        let caches: Vec<CacheSavings> = stats
            .iter()
            .map(|s| {
                let without = s.total_requests() as f64 * cost.cold_start_secs;
                let with = s.misses as f64 * cost.miss_secs + s.hits as f64 * cost.hit_secs;
                CacheSavings {
                    name: s.name.clone(),
                    requests: s.total_requests(),
                    time_without_cache_secs: without,
                    time_with_cache_secs: with,
                    time_saved_secs: without - with,
                }
            })
            .collect();

        let total_requests = caches.iter().map(|c| c.requests).sum();
        let total_without: f64 = caches.iter().map(|c| c.time_without_cache_secs).sum();
        let total_with: f64 = caches.iter().map(|c| c.time_with_cache_secs).sum();
        let total_saved = total_without - total_with;

        Self {
            generated_at: Utc::now(),
            uptime_secs: uptime.as_secs(),
            cost_model: cost,
            caches,
            total_requests,
            total_time_saved_secs: total_saved,
            total_time_saved_hours: total_saved / 3600.0,
            // Floor the denominator so an idle registry reports 0x, not NaN.
            average_speedup: total_without / total_with.max(0.001),
        }
    }

    /// Human-readable rendering for the CLI.
    pub fn render_text(&self) -> String {
        let rule = "=".repeat(70);
        let mut out = String::new();
        let _ = writeln!(out, "{rule}");
        let _ = writeln!(out, "CACHE PERFORMANCE REPORT");
        let _ = writeln!(out, "{rule}");
        let _ = writeln!(out, "Generated:       {}", self.generated_at.format("%Y-%m-%d %H:%M:%S UTC"));
        let _ = writeln!(out, "Uptime:          {}s", self.uptime_secs);
        let _ = writeln!(out, "Total requests:  {}", self.total_requests);
        let _ = writeln!(out);
        let _ = writeln!(out, "Time saved:");
        for c in &self.caches {
            let _ = writeln!(out, "  {:<26} {:>10.2} hours", c.name, c.time_saved_hours());
        }
        let _ = writeln!(out, "  {:<26} {:>10.2} hours", "Total", self.total_time_saved_hours);
        let _ = writeln!(out);
        let _ = writeln!(out, "Average speedup: {:.1}x faster", self.average_speedup);
        let _ = writeln!(out, "{rule}");
        out
    }
}

// ============================================================================
// HTTP endpoint
// ============================================================================

/// Everything a request handler needs.
#[derive(Clone)]
pub struct MonitorState {
    pub registry: CacheRegistry,
    pub cost: CostModel,
    /// SHA-256 of the admin token, when one is configured.
    admin_token_hash: Option<[u8; 32]>,
}

impl MonitorState {
    pub fn new(registry: CacheRegistry, cost: CostModel, admin_token: Option<&str>) -> Self {
        Self {
            registry,
            cost,
            admin_token_hash: admin_token.map(hash_token),
        }
    }

    pub fn from_config(registry: CacheRegistry, config: &MonitorConfig) -> Self {
        Self::new(registry, CostModel::from(config), config.admin_token.as_deref())
    }

    /// `true` when no token is configured or `authorization` carries it.
    ///
    /// Both sides are hashed first so the comparison is constant-time
    /// regardless of the presented token's length.
    fn is_authorized(&self, authorization: Option<&str>) -> bool {
        let Some(expected) = self.admin_token_hash else {
            return true;
        };
        let Some(presented) = authorization.and_then(|h| h.strip_prefix("Bearer ")) else {
            return false;
        };
        bool::from(expected[..].ct_eq(&hash_token(presented.trim())[..]))
    }
}

fn hash_token(token: &str) -> [u8; 32] {
    let mut out = [0u8; 32];
    out.copy_from_slice(&Sha256::digest(token.as_bytes()));
    out
}

/// A response ready to be written to the socket.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    pub status: &'static str,
    pub content_type: &'static str,
    pub body: String,
}

impl Response {
    fn json(status: &'static str, body: String) -> Self {
        Self {
            status,
            content_type: "application/json",
            body,
        }
    }

    fn error(status: &'static str, error: &str) -> Self {
        Self::json(status, serde_json::json!({ "error": error }).to_string())
    }

    fn to_http(&self) -> String {
        format!(
            "HTTP/1.1 {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            self.status,
            self.content_type,
            self.body.len(),
            self.body
        )
    }
}

/// Route one request.
///
/// - `GET /health` → liveness plus cache names
/// - `GET /stats` → [`StatsReport`] JSON
/// - `GET /metrics` → Prometheus text
/// - `GET /report` → [`PerformanceReport`] JSON
/// - `POST /admin/clear` → clear every cache (or `?cache=<name>`)
/// - `POST /admin/clear-stats` → reset every cache's counters (or `?cache=<name>`)
pub fn handle_request(
    state: &MonitorState,
    method: &str,
    target: &str,
    authorization: Option<&str>,
) -> Response {
    let (path, query) = target.split_once('?').unwrap_or((target, ""));
    let cache_param = url::form_urlencoded::parse(query.as_bytes())
        .find(|(k, _)| *k == "cache")
        .map(|(_, v)| v.into_owned());

    match (method, path) {
        ("GET", "/health") => Response::json(
            "200 OK",
            serde_json::json!({
                "status": "ok",
                "version": env!("CARGO_PKG_VERSION"),
                "uptime_secs": state.registry.uptime().as_secs(),
                "caches": state.registry.names(),
            })
            .to_string(),
        ),
        ("GET", "/stats") => to_json(&StatsReport::from_registry(&state.registry)),
        ("GET", "/metrics") => Response {
            status: "200 OK",
            content_type: "text/plain; version=0.0.4",
            body: render_prometheus(&state.registry.stats_all()),
        },
        ("GET", "/report") => to_json(&PerformanceReport::build(
            &state.registry.stats_all(),
            state.cost,
            state.registry.uptime(),
        )),
        ("POST", "/admin/clear") | ("POST", "/admin/clear-stats") => {
            if !state.is_authorized(authorization) {
                warn!(path, "Rejected unauthorized admin request");
                return Response::error("401 Unauthorized", "unauthorized");
            }
            let reset_stats = path == "/admin/clear-stats";
            let cleared = match cache_param {
                Some(name) => match state.registry.get(&name) {
                    Some(cache) => {
                        if reset_stats {
                            cache.clear_stats();
                        } else {
                            cache.clear();
                        }
                        1
                    }
                    None => return Response::error("404 Not Found", "unknown_cache"),
                },
                None if reset_stats => state.registry.clear_stats_all(),
                None => state.registry.clear_all(),
            };
            Response::json(
                "200 OK",
                serde_json::json!({ "status": "ok", "caches": cleared }).to_string(),
            )
        }
        (_, "/health" | "/stats" | "/metrics" | "/report" | "/admin/clear" | "/admin/clear-stats") => {
            Response::error("405 Method Not Allowed", "method_not_allowed")
        }
        _ => Response::error("404 Not Found", "not_found"),
    }
}

fn to_json<T: Serialize>(value: &T) -> Response {
    match serde_json::to_string(value) {
        Ok(body) => Response::json("200 OK", body),
        Err(e) => Response::error("500 Internal Server Error", &e.to_string()),
    }
}

/// Split a raw request into method, target and `Authorization` header.
fn parse_request(raw: &str) -> (&str, &str, Option<&str>) {
    let mut lines = raw.lines();
    let request_line = lines.next().unwrap_or_default();
    let mut parts = request_line.split_whitespace();
    let method = parts.next().unwrap_or_default();
    let target = parts.next().unwrap_or_default();
    let authorization = lines
        .take_while(|line| !line.is_empty())
        .filter_map(|line| line.split_once(':'))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("authorization"))
        .map(|(_, value)| value.trim());
    (method, target, authorization)
}

/// Start the monitor endpoint.
///
/// Returns the bound address (useful with port 0) and a `JoinHandle` so
/// callers can abort on shutdown.
pub async fn start_monitor_server(
    host: &str,
    port: u16,
    state: MonitorState,
) -> Result<(SocketAddr, tokio::task::JoinHandle<()>)> {
    let listener = TcpListener::bind((host, port)).await?;
    let addr = listener.local_addr()?;
    info!(addr = %addr, "Cache monitor listening on http://{}", addr);

    let handle = tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut stream, peer)) => {
                    let state = state.clone();
                    tokio::spawn(async move {
                        let mut buf = vec![0u8; MAX_REQUEST_BYTES];
                        let n = match tokio::time::timeout(
                            Duration::from_secs(READ_TIMEOUT_SECS),
                            stream.read(&mut buf),
                        )
                        .await
                        {
                            Ok(Ok(n)) => n,
                            _ => return,
                        };

                        let raw = String::from_utf8_lossy(&buf[..n]);
                        let (method, target, authorization) = parse_request(&raw);
                        let response = handle_request(&state, method, target, authorization);
                        debug!(peer = %peer, method, target, status = response.status, "Monitor request");

                        let _ = stream.write_all(response.to_http().as_bytes()).await;
                        let _ = stream.shutdown().await;
                    });
                }
                Err(e) => {
                    warn!(error = %e, "Monitor accept error");
                }
            }
        }
    });

    Ok((addr, handle))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{CacheKey, ResourceCache};
    use crate::error::CacheError;
    use std::sync::Arc;

    type TestCache = ResourceCache<Arc<String>, CacheError>;

    fn stats(name: &str, hits: u64, misses: u64) -> CacheStats {
        CacheStats {
            name: name.into(),
            hits,
            misses,
            size: 3,
            capacity: 100,
            ..Default::default()
        }
    }

    async fn populated_state(token: Option<&str>) -> (MonitorState, TestCache) {
        let cache: TestCache = ResourceCache::new("embedding", 10, Duration::from_secs(60));
        for _ in 0..3 {
            cache
                .get_or_create(&CacheKey::derive(["t", "openai", "m"]), || async {
                    Ok(Arc::new("client".to_string()))
                })
                .await
                .unwrap();
        }
        let registry = CacheRegistry::new();
        registry.register(Arc::new(cache.clone()));
        (MonitorState::new(registry, CostModel::default(), token), cache)
    }

    #[test]
    fn test_render_prometheus() {
        let text = render_prometheus(&[stats("embedding", 9, 1), stats("rerank_model", 0, 0)]);
        assert!(text.contains("# TYPE rescache_hits_total counter"));
        assert!(text.contains("rescache_hits_total{cache=\"embedding\"} 9"));
        assert!(text.contains("rescache_misses_total{cache=\"rerank_model\"} 0"));
        assert!(text.contains("rescache_hit_rate{cache=\"embedding\"} 0.9000"));
        assert!(text.contains("# TYPE rescache_size gauge"));
        assert_eq!(text.matches("# HELP rescache_capacity").count(), 1);
    }

    #[test]
    fn test_escape_label() {
        assert_eq!(escape_label("a\"b\\c"), "a\\\"b\\\\c");
    }

    #[test]
    fn test_performance_report_math() {
        let report = PerformanceReport::build(
            &[stats("embedding", 90, 10), stats("vector_processor", 0, 0)],
            CostModel::default(),
            Duration::from_secs(7),
        );
        let embedding = &report.caches[0];
        assert_eq!(embedding.requests, 100);
        assert!((embedding.time_without_cache_secs - 1500.0).abs() < 1e-9);
        assert!((embedding.time_with_cache_secs - (10.0 * 2.06 + 90.0 * 0.0001)).abs() < 1e-9);
        assert_eq!(report.total_requests, 100);
        assert!((report.total_time_saved_secs - embedding.time_saved_secs).abs() < 1e-9);
        assert!(report.average_speedup > 70.0);
        assert_eq!(report.uptime_secs, 7);
        assert!(report.render_text().contains("CACHE PERFORMANCE REPORT"));
    }

    #[test]
    fn test_performance_report_empty_is_finite() {
        let report = PerformanceReport::build(&[], CostModel::default(), Duration::ZERO);
        assert_eq!(report.total_requests, 0);
        assert_eq!(report.average_speedup, 0.0);
    }

    #[test]
    fn test_parse_request() {
        let raw = "POST /admin/clear?cache=embedding HTTP/1.1\r\nHost: x\r\nauthorization: Bearer abc\r\n\r\n";
        let (method, target, auth) = parse_request(raw);
        assert_eq!(method, "POST");
        assert_eq!(target, "/admin/clear?cache=embedding");
        assert_eq!(auth, Some("Bearer abc"));
        assert_eq!(parse_request(""), ("", "", None));
    }

    #[tokio::test]
    async fn test_stats_route() {
        let (state, _cache) = populated_state(None).await;
        let response = handle_request(&state, "GET", "/stats", None);
        assert_eq!(response.status, "200 OK");

        let report: StatsReport = serde_json::from_str(&response.body).unwrap();
        assert_eq!(report.caches.len(), 1);
        let view = &report.caches[0];
        assert_eq!(view.stats.name, "embedding");
        assert_eq!((view.stats.hits, view.stats.misses), (2, 1));
        assert_eq!(view.efficiency, "Fair (50-75%)");
    }

    #[tokio::test]
    async fn test_metrics_and_unknown_routes() {
        let (state, _cache) = populated_state(None).await;
        let metrics = handle_request(&state, "GET", "/metrics", None);
        assert!(metrics.content_type.starts_with("text/plain"));
        assert!(metrics.body.contains("rescache_size{cache=\"embedding\"} 1"));

        assert_eq!(handle_request(&state, "GET", "/nope", None).status, "404 Not Found");
        assert_eq!(
            handle_request(&state, "DELETE", "/stats", None).status,
            "405 Method Not Allowed"
        );
    }

    #[tokio::test]
    async fn test_admin_requires_token() {
        let (state, cache) = populated_state(Some("s3cret")).await;

        let denied = handle_request(&state, "POST", "/admin/clear", None);
        assert_eq!(denied.status, "401 Unauthorized");
        let wrong = handle_request(&state, "POST", "/admin/clear", Some("Bearer nope"));
        assert_eq!(wrong.status, "401 Unauthorized");
        assert_eq!(cache.len(), 1);

        let ok = handle_request(&state, "POST", "/admin/clear", Some("Bearer s3cret"));
        assert_eq!(ok.status, "200 OK");
        assert!(cache.is_empty());
        assert_eq!(cache.stats().hits, 2, "clear keeps counters");
    }

    #[tokio::test]
    async fn test_admin_clear_stats_single_cache() {
        let (state, cache) = populated_state(None).await;

        let missing = handle_request(&state, "POST", "/admin/clear-stats?cache=nope", None);
        assert_eq!(missing.status, "404 Not Found");

        let ok = handle_request(&state, "POST", "/admin/clear-stats?cache=embedding", None);
        assert_eq!(ok.status, "200 OK");
        assert_eq!(cache.stats().total_requests(), 0);
        assert_eq!(cache.len(), 1, "clear-stats keeps entries");
    }

    #[tokio::test]
    async fn test_monitor_server_serves_health() {
        let (state, _cache) = populated_state(None).await;
        let (addr, handle) = start_monitor_server("127.0.0.1", 0, state).await.unwrap();

        let mut stream = tokio::net::TcpStream::connect(addr).await.unwrap();
        stream
            .write_all(b"GET /health HTTP/1.1\r\nHost: localhost\r\n\r\n")
            .await
            .unwrap();

        let mut response = String::new();
        stream.read_to_string(&mut response).await.unwrap();
        assert!(response.starts_with("HTTP/1.1 200 OK"), "response: {}", response);
        assert!(response.contains("\"status\":\"ok\""));
        assert!(response.contains("embedding"));

        handle.abort();
    }

    #[tokio::test]
    async fn test_periodic_stats_log_stops_on_shutdown() {
        let (state, _cache) = populated_state(None).await;
        let (tx, rx) = tokio::sync::watch::channel(false);
        let handle = start_periodic_stats_log(state.registry.clone(), Duration::from_millis(10), rx);

        tokio::time::sleep(Duration::from_millis(30)).await;
        tx.send(true).unwrap();
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("stats log should stop on shutdown")
            .unwrap();
    }

    #[tokio::test]
    async fn test_periodic_stats_log_zero_interval_is_disabled() {
        let (state, _cache) = populated_state(None).await;
        let (_tx, rx) = tokio::sync::watch::channel(false);
        let handle = start_periodic_stats_log(state.registry.clone(), Duration::ZERO, rx);
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("disabled stats log should finish at once")
            .unwrap();
    }

    #[tokio::test]
    async fn test_admin_cache_param_is_percent_decoded() {
        let cache: TestCache = ResourceCache::new("tenant a/embedding", 10, Duration::from_secs(60));
        cache
            .get_or_create(&CacheKey::derive(["t", "openai", "m"]), || async {
                Ok(Arc::new("client".to_string()))
            })
            .await
            .unwrap();
        let registry = CacheRegistry::new();
        registry.register(Arc::new(cache.clone()));
        let state = MonitorState::new(registry, CostModel::default(), None);

        let encoded = handle_request(&state, "POST", "/admin/clear?cache=tenant%20a%2Fembedding", None);
        assert_eq!(encoded.status, "200 OK");
        assert!(cache.is_empty());

        let plus = handle_request(&state, "POST", "/admin/clear-stats?cache=tenant+a/embedding", None);
        assert_eq!(plus.status, "200 OK");
        assert_eq!(cache.stats().total_requests(), 0);
    }
}
