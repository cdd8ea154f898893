//! Partition routing tables.
//!
//! This module maps a record's namespace and key digest to the nodes that own
//! it, without a network round trip:
//! - Digest hashing to a partition id
//! - Per-namespace partition tables
//! - A collection of tables published as one immutable snapshot
//! - Resolution of a key to its partition and owning nodes
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │ Cluster                                                      │
//! │   ArcSwap<PartitionTables>  ◄── publish(new snapshot)        │
//! │          │                        (tending)                  │
//! │          ▼                                                   │
//! │   PartitionTables ─┬─ Arc<PartitionTable "test">             │
//! │                    └─ Arc<PartitionTable "bar">              │
//! │                              │                               │
//! │                              ▼                               │
//! │            [ Partition { master, prole, regime } ; 4096 ]    │
//! └─────────────────────────────────────────────────────────────┘
//!
//! resolve("test", digest)
//!   → load snapshot → get("test") → retain table
//!   → partition_id(digest) → PartitionInfo (releases table on drop)
//! ```
//!
//! # Example
//!
//! ```rust
//! use cluster_partitions::{Cluster, ClusterConfig, Namespace, Node, PartitionUpdate, Replica};
//! use cluster_partitions::partitioning::PartitionResolver;
//!
//! # fn main() -> cluster_partitions::Result<()> {
//! let cluster = Cluster::new(ClusterConfig::new(4))?;
//! let node = Node::new("BB9000000000001", "127.0.0.1:3000".parse().unwrap());
//!
//! let mut builder = cluster.rebuild()?;
//! let ns = Namespace::new("test")?;
//! builder.update_partition(&ns, 4, false, PartitionUpdate::new(3, Some(node.clone())))?;
//! cluster.publish(builder.build());
//!
//! let mut digest = [0u8; 20];
//! digest[0] = 0x03;
//! let info = cluster.resolve("test", &digest)?;
//! assert_eq!(info.partition_id(), 3);
//! assert!(info.node(Replica::Master, false).is_some());
//! # Ok(())
//! # }
//! ```

mod digest;
mod resolver;
mod table;
mod tables;

pub use digest::partition_id;
pub use resolver::{resolve, PartitionInfo, PartitionResolver, Replica};
pub use table::{Partition, PartitionTable};
pub use tables::{PartitionTables, PartitionTablesBuilder, PartitionUpdate};
