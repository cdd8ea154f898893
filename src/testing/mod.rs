//! Testing utilities for partition routing.
//!
//! [`TestTopology`] builds a set of nodes and fills partition tables with a
//! deterministic round-robin assignment, standing in for the tending process.
//!
//! # Example
//!
//! ```rust
//! use cluster_partitions::testing::TestTopology;
//! use cluster_partitions::{Cluster, ClusterConfig};
//! use cluster_partitions::partitioning::PartitionResolver;
//!
//! # fn main() -> cluster_partitions::Result<()> {
//! let cluster = Cluster::new(ClusterConfig::new(16))?;
//! let topology = TestTopology::new(3);
//! topology.publish(&cluster, &["test"], false, 0)?;
//!
//! let info = cluster.resolve("test", &TestTopology::digest_for(5))?;
//! assert_eq!(info.partition_id(), 5);
//! # Ok(())
//! # }
//! ```


use crate::cluster::Cluster;
use crate::error::Result;
use crate::node::{Node, NodeRef};
use crate::partitioning::{PartitionTablesBuilder, PartitionUpdate};
use crate::types::{Digest, Namespace, PartitionId, Regime, DIGEST_SIZE};
use std::net::{Ipv4Addr, SocketAddr};

/// A fixed set of nodes used to populate partition tables.
#[derive(Debug, Clone)]
pub struct TestTopology {
    /// Nodes in the topology.
    pub nodes: Vec<NodeRef>,
}

impl TestTopology {
    /// Create a topology with `node_count` nodes on consecutive ports.
    ///
    /// # Panics
    ///
    /// Panics if `node_count` is zero.
    pub fn new(node_count: usize) -> Self {
        assert!(node_count > 0, "a test topology needs at least one node");
        let nodes = (0..node_count)
            .map(|i| {
                let port = 3000 + i as u16;
                Node::new(
                    format!("BB90000000000{:02}", i + 1),
                    SocketAddr::from((Ipv4Addr::LOCALHOST, port)),
                )
            })
            .collect();
        Self { nodes }
    }

    /// Get the number of nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Expected master of a partition.
    pub fn master_of(&self, partition_id: PartitionId) -> &NodeRef {
        &self.nodes[partition_id as usize % self.nodes.len()]
    }

    /// Expected prole of a partition. `None` with a single node.
    pub fn prole_of(&self, partition_id: PartitionId) -> Option<&NodeRef> {
        if self.nodes.len() < 2 {
            return None;
        }
        Some(&self.nodes[(partition_id as usize + 1) % self.nodes.len()])
    }

    /// Assign every partition of `namespace` round-robin over the nodes.
    pub fn populate(
        &self,
        builder: &mut PartitionTablesBuilder,
        namespace: &Namespace,
        partition_count: u32,
        sc_mode: bool,
        regime: Regime,
    ) -> Result<()> {
        for partition_id in 0..partition_count {
            let update =
                PartitionUpdate::new(partition_id, Some(self.master_of(partition_id).clone()))
                    .with_prole(self.prole_of(partition_id).cloned())
                    .with_regime(regime);
            builder.update_partition(namespace, partition_count, sc_mode, update)?;
        }
        Ok(())
    }

    /// Populate `namespaces` on top of the cluster's current tables and
    /// publish the result.
    pub fn publish(
        &self,
        cluster: &Cluster,
        namespaces: &[&str],
        sc_mode: bool,
        regime: Regime,
    ) -> Result<()> {
        let mut builder = cluster.rebuild()?;
        for name in namespaces {
            let namespace = Namespace::new(name)?;
            self.populate(&mut builder, &namespace, cluster.n_partitions(), sc_mode, regime)?;
        }
        cluster.publish_builder(builder);
        Ok(())
    }

    /// A digest that hashes to `partition_id` for any larger partition count.
    pub fn digest_for(partition_id: PartitionId) -> Digest {
        let mut digest = [0x5A; DIGEST_SIZE];
        digest[..2].copy_from_slice(&(partition_id as u16).to_le_bytes());
        digest
    }
}
