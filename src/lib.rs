//! Partition routing for a clustered key-value client.
//!
//! Given a record's namespace and key digest, this crate resolves which
//! cluster node owns (or replicates) the record's partition, without a network
//! round trip. It stays correct and lock-free for readers while the cluster
//! topology changes underneath them.
//!
//! # Features
//!
//! - Digest to partition id hashing
//! - Per-namespace partition tables with master, prole and regime per partition
//! - Immutable, reference counted table snapshots published with one atomic swap
//! - Resolution that keeps its table alive for the duration of a request
//! - Node reference queries for safe node retirement
//!
//! # Example
//!
//! ```rust
//! use cluster_partitions::{Cluster, ClusterConfig, Namespace, Node, PartitionUpdate, Replica};
//! use cluster_partitions::partitioning::PartitionResolver;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let cluster = Cluster::new(ClusterConfig::new(4096))?;
//! let node = Node::new("BB9000000000001", "127.0.0.1:3000".parse()?);
//!
//! // Tending: build the next snapshot and publish it.
//! let mut builder = cluster.rebuild()?;
//! let ns = Namespace::new("test")?;
//! for id in 0..cluster.n_partitions() {
//!     builder.update_partition(&ns, 4096, false, PartitionUpdate::new(id, Some(node.clone())))?;
//! }
//! cluster.publish_builder(builder);
//!
//! // Request path: resolve, use the node, drop the info.
//! let digest = [0u8; 20];
//! let info = cluster.resolve("test", &digest)?;
//! let target = info.node(Replica::Sequence, false);
//! assert!(target.is_some());
//! # Ok(())
//! # }
//! ```
//!
//! # Concurrency Model
//!
//! - **Reads**: lock-free snapshot load plus one atomic increment
//! - **Writes**: the tending process builds a new snapshot and swaps it in
//! - **Lifetime**: a table lives until the last snapshot or reader holding it
//!   lets go

pub mod cluster;
pub mod config;
pub mod error;
pub mod metrics;
pub mod node;
pub mod partitioning;
pub mod testing;
pub mod types;

// Re-export main types for convenience
pub use cluster::Cluster;
pub use config::{ClusterConfig, DEFAULT_PARTITIONS};
pub use error::{Error, Result};
pub use node::{Node, NodeRef};
pub use types::{Digest, Namespace, PartitionId, Regime, DIGEST_SIZE, MAX_NAMESPACE_LEN};

// Re-export partitioning types
pub use partitioning::{
    partition_id, resolve, Partition, PartitionInfo, PartitionResolver, PartitionTable,
    PartitionTables, PartitionTablesBuilder, PartitionUpdate, Replica,
};

// Re-export metrics types
pub use metrics::{RouterMetrics, RouterMetricsSnapshot};
