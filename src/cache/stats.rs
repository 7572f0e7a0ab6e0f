//! Cache counters and derived ratios.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Raw counters, mutated only under the cache's state lock.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct Counters {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub expired: u64,
}

/// Point-in-time snapshot of one cache.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CacheStats {
    /// Cache instance name (e.g. `"embedding"`).
    pub name: String,
    /// Lookups served from a resident entry or a joined construction.
    pub hits: u64,
    /// Successful constructions.
    pub misses: u64,
    /// Entries dropped to stay within capacity.
    pub evictions: u64,
    /// Entries dropped because they outlived the TTL.
    pub expired: u64,
    /// Resident entries at snapshot time.
    pub size: usize,
    /// Configured capacity (0 = pass-through).
    pub capacity: usize,
}

impl CacheStats {
    pub(crate) fn from_counters(
        name: &str,
        counters: Counters,
        size: usize,
        capacity: usize,
    ) -> Self {
        Self {
            name: name.to_string(),
            hits: counters.hits,
            misses: counters.misses,
            evictions: counters.evictions,
            expired: counters.expired,
            size,
            capacity,
        }
    }

    /// `hits / (hits + misses)`, 0.0 when there were no requests.
    pub fn hit_rate(&self) -> f64 {
        let total = self.total_requests();
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    /// Returns total requests (hits + misses).
    pub fn total_requests(&self) -> u64 {
        self.hits + self.misses
    }

    pub fn efficiency(&self) -> Efficiency {
        Efficiency::rate(self.hits, self.misses)
    }
}

/// Coarse rating of a hit rate for operator dashboards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Efficiency {
    NoData,
    /// 90% and above.
    Excellent,
    /// 75% to 90%.
    Good,
    /// 50% to 75%.
    Fair,
    /// Below 50%.
    Poor,
}

impl Efficiency {
    pub fn rate(hits: u64, misses: u64) -> Self {
        let total = hits + misses;
        if total == 0 {
            return Efficiency::NoData;
        }
        let rate = hits as f64 / total as f64;
        if rate >= 0.9 {
            Efficiency::Excellent
        } else if rate >= 0.75 {
            Efficiency::Good
        } else if rate >= 0.5 {
            Efficiency::Fair
        } else {
            Efficiency::Poor
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Efficiency::NoData => "No data",
            Efficiency::Excellent => "Excellent (90%+)",
            Efficiency::Good => "Good (75-90%)",
            Efficiency::Fair => "Fair (50-75%)",
            Efficiency::Poor => "Poor (<50%)",
        }
    }
}

impl fmt::Display for Efficiency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
