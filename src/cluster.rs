//! Cluster routing context.
//!
//! A [`Cluster`] holds the single published [`PartitionTables`] snapshot for a
//! client. Request threads resolve against whatever snapshot is current; the
//! tending process builds a replacement and swaps it in.
//!
//! # Locking Strategy
//!
//! ## Read Path (`resolve`)
//! 1. Lock-free load of the current snapshot (`ArcSwap::load`)
//! 2. Linear namespace lookup in the immutable collection
//! 3. Atomic increment of the table's reference count
//!
//! ## Write Path (`publish`)
//! - Publishers serialize on a mutex that owns the generation counter
//! - Atomic pointer swap. The previous snapshot is released, not mutated;
//!   readers that retained one of its tables keep using it until they drop
//!   their `PartitionInfo`.

use crate::config::ClusterConfig;
use crate::error::{Error, Result};
use crate::metrics::RouterMetrics;
use crate::node::NodeRef;
use crate::partitioning::{
    PartitionInfo, PartitionResolver, PartitionTables, PartitionTablesBuilder,
};
use crate::types::{Digest, Namespace};
use arc_swap::ArcSwap;
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, info};

/// Routing state for one cluster.
#[derive(Debug)]
pub struct Cluster {
    config: ClusterConfig,

    /// Currently published partition tables.
    tables: ArcSwap<PartitionTables>,

    /// Generation of the last publication. Held across the swap.
    generation: Mutex<u64>,

    metrics: RouterMetrics,
}

impl Cluster {
    /// Create a cluster context with an empty published collection.
    pub fn new(config: ClusterConfig) -> Result<Self> {
        config.validate()?;
        let tables = PartitionTables::with_capacity(config.namespace_capacity)?;

        Ok(Self {
            config,
            tables: ArcSwap::from_pointee(tables),
            generation: Mutex::new(0),
            metrics: RouterMetrics::new(),
        })
    }

    pub fn config(&self) -> &ClusterConfig {
        &self.config
    }

    pub fn metrics(&self) -> &RouterMetrics {
        &self.metrics
    }

    /// Partition count per namespace.
    pub fn n_partitions(&self) -> u32 {
        self.config.n_partitions
    }

    /// Retain the currently published collection.
    pub fn partition_tables(&self) -> Arc<PartitionTables> {
        self.tables.load_full()
    }

    /// Namespaces in the published collection.
    pub fn namespaces(&self) -> Vec<Namespace> {
        self.tables.load().namespaces()
    }

    /// Start building the next collection from the published one.
    ///
    /// Every table added through the builder must have
    /// [`n_partitions`](Self::n_partitions) partitions.
    pub fn rebuild(&self) -> Result<PartitionTablesBuilder> {
        let builder = PartitionTablesBuilder::from_tables(&self.tables.load())?;
        Ok(builder.with_partition_count(self.config.n_partitions))
    }

    /// Atomically replace the published collection.
    ///
    /// The collection is stamped with the next generation. The previous
    /// collection is released. Its tables are destroyed once no reader and
    /// no newer collection still holds them.
    pub fn publish(&self, tables: PartitionTables) {
        self.publish_with_stats(tables, 0);
    }

    /// Publish a builder's result, recording its stale-regime count.
    pub fn publish_builder(&self, builder: PartitionTablesBuilder) {
        let stale = builder.stale_regimes();
        self.publish_with_stats(builder.build(), stale);
    }

    fn publish_with_stats(&self, mut tables: PartitionTables, stale_regimes: u64) {
        let mut current = self.generation.lock();
        *current += 1;
        let generation = *current;
        tables.stamp_generation(generation);

        let namespaces = tables.len();
        let previous = self.tables.swap(Arc::new(tables));
        self.metrics.record_publish(namespaces, stale_regimes);
        drop(current);

        info!(
            generation,
            previous_generation = previous.generation(),
            namespaces,
            stale_regimes,
            "Published partition tables"
        );
    }

    /// Whether any published partition still references `node`.
    ///
    /// The tending process uses this before tearing down a node that dropped
    /// out of discovery.
    pub fn is_node_referenced(&self, node: &NodeRef) -> bool {
        let referenced = self.tables.load().find_node(node);
        debug!(node = %node, referenced, "Checked node references");
        referenced
    }

    /// Resolve and pick a node using the configured replica policy.
    pub fn resolve_node(
        &self,
        namespace: &str,
        digest: &Digest,
        is_write: bool,
    ) -> Result<Option<NodeRef>> {
        let info = self.resolve(namespace, digest)?;
        Ok(info.node(self.config.replica, is_write))
    }
}

impl PartitionResolver for Cluster {
    fn resolve(&self, namespace: &str, digest: &Digest) -> Result<PartitionInfo> {
        let tables = self.tables.load();
        match tables.get(namespace) {
            Some(table) => {
                self.metrics.record_resolve();
                Ok(PartitionInfo::new(table.retain(), digest))
            }
            None => {
                self.metrics.record_namespace_miss();
                Err(Error::NamespaceNotFound(namespace.to_string()))
            }
        }
    }
}
