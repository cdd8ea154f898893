//! Metrics for partition routing.
//!
//! Prometheus-style counters and gauges kept in process:
//! - Counters for resolutions, namespace misses and publications
//! - A gauge for the number of known namespaces
//!
//! Recording is a single atomic add, so the request path never waits.
//!
//! # Example
//!
//! ```rust
//! use cluster_partitions::metrics::RouterMetrics;
//!
//! let metrics = RouterMetrics::new();
//! metrics.record_resolve();
//! metrics.record_namespace_miss();
//!
//! let snapshot = metrics.snapshot();
//! assert_eq!(snapshot.resolves, 2);
//! assert_eq!(snapshot.namespace_misses, 1);
//! assert!(metrics.to_prometheus().contains("partition_resolves_total 2"));
//! ```

mod counters;
mod gauges;

pub use counters::Counter;
pub use gauges::Gauge;

use serde::Serialize;

/// Routing metrics owned by a [`Cluster`](crate::Cluster).
#[derive(Debug)]
pub struct RouterMetrics {
    /// Resolution attempts, successful or not.
    pub resolves: Counter,
    /// Resolutions against an unknown namespace.
    pub namespace_misses: Counter,
    /// Collections published.
    pub publications: Counter,
    /// Assignments ignored because their regime was stale.
    pub stale_regimes: Counter,
    /// Namespaces in the published collection.
    pub namespaces: Gauge,
}

impl RouterMetrics {
    pub fn new() -> Self {
        Self {
            resolves: Counter::new("partition_resolves_total", "Partition resolutions"),
            namespace_misses: Counter::new(
                "partition_namespace_misses_total",
                "Resolutions for namespaces absent from the partition tables",
            ),
            publications: Counter::new(
                "partition_tables_published_total",
                "Partition table collections published",
            ),
            stale_regimes: Counter::new(
                "partition_stale_regimes_total",
                "Partition assignments ignored for a stale regime",
            ),
            namespaces: Gauge::new("partition_namespaces", "Namespaces with a partition table"),
        }
    }

    /// Record a resolution attempt.
    pub fn record_resolve(&self) {
        self.resolves.inc();
    }

    /// Record a resolution against an unknown namespace.
    pub fn record_namespace_miss(&self) {
        self.resolves.inc();
        self.namespace_misses.inc();
    }

    /// Record a publication.
    pub fn record_publish(&self, namespaces: usize, stale_regimes: u64) {
        self.publications.inc();
        self.stale_regimes.inc_by(stale_regimes);
        self.namespaces.set(namespaces as i64);
    }

    /// Take a point-in-time snapshot.
    pub fn snapshot(&self) -> RouterMetricsSnapshot {
        RouterMetricsSnapshot {
            resolves: self.resolves.get(),
            namespace_misses: self.namespace_misses.get(),
            publications: self.publications.get(),
            stale_regimes: self.stale_regimes.get(),
            namespaces: self.namespaces.get(),
        }
    }

    /// Export all metrics in Prometheus text format.
    pub fn to_prometheus(&self) -> String {
        let mut output = String::new();

        macro_rules! add_counter {
            ($counter:expr) => {
                output.push_str(&format!(
                    "# HELP {} {}\n# TYPE {} counter\n{} {}\n",
                    $counter.name(),
                    $counter.help(),
                    $counter.name(),
                    $counter.name(),
                    $counter.get()
                ));
            };
        }

        macro_rules! add_gauge {
            ($gauge:expr) => {
                output.push_str(&format!(
                    "# HELP {} {}\n# TYPE {} gauge\n{} {}\n",
                    $gauge.name(),
                    $gauge.help(),
                    $gauge.name(),
                    $gauge.name(),
                    $gauge.get()
                ));
            };
        }

        add_counter!(self.resolves);
        add_counter!(self.namespace_misses);
        add_counter!(self.publications);
        add_counter!(self.stale_regimes);
        add_gauge!(self.namespaces);

        output
    }
}

impl Default for RouterMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Point-in-time copy of [`RouterMetrics`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RouterMetricsSnapshot {
    pub resolves: u64,
    pub namespace_misses: u64,
    pub publications: u64,
    pub stale_regimes: u64,
    pub namespaces: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot() {
        let metrics = RouterMetrics::new();
        metrics.record_resolve();
        metrics.record_namespace_miss();
        metrics.record_namespace_miss();
        metrics.record_publish(3, 2);

        let snapshot = metrics.snapshot();
        assert_eq!(
            snapshot,
            RouterMetricsSnapshot {
                resolves: 3,
                namespace_misses: 2,
                publications: 1,
                stale_regimes: 2,
                namespaces: 3,
            }
        );
        assert_eq!(metrics.namespace_misses.get(), 2);
    }

    #[test]
    fn test_prometheus_output() {
        let metrics = RouterMetrics::new();
        metrics.record_resolve();
        metrics.record_namespace_miss();
        metrics.record_publish(2, 0);

        let output = metrics.to_prometheus();
        assert!(output.contains("# HELP partition_resolves_total Partition resolutions"));
        assert!(output.contains("# TYPE partition_resolves_total counter"));
        assert!(output.contains("partition_resolves_total 2"));
        assert!(output.contains("partition_namespace_misses_total 1"));
        assert!(output.contains("partition_tables_published_total 1"));
        assert!(output.contains("partition_stale_regimes_total 0"));
        assert!(output.contains("# TYPE partition_namespaces gauge"));
        assert!(output.contains("partition_namespaces 2"));
    }

    #[test]
    fn test_snapshot_serializes() {
        let json = serde_json::to_value(RouterMetrics::new().snapshot()).unwrap();
        assert_eq!(json["publications"], 0);
    }
}
