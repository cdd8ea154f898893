//! Key to partition resolution.
//!
//! Resolution never blocks and never waits for topology to settle. A
//! [`PartitionInfo`] keeps its table alive for as long as the caller holds it,
//! so a rebuild published mid-request cannot pull the nodes out from under
//! the caller. The table reference is released when the info is dropped.

use crate::error::Result;
use crate::node::NodeRef;
use crate::partitioning::digest::partition_id;
use crate::partitioning::table::{Partition, PartitionTable};
use crate::types::{Digest, Namespace, PartitionId, Regime};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Which owner of a partition serves reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Replica {
    /// Always the master.
    Master,
    /// The master, then the prole if the master is unknown or inactive.
    #[default]
    Sequence,
}

/// Resolves a namespace and digest to a partition.
///
/// The in-process implementation is [`Cluster`](crate::Cluster). Other
/// partition representations, such as one shared between processes, plug in
/// behind the same contract.
pub trait PartitionResolver {
    /// Find the partition owning `digest` in `namespace`.
    ///
    /// Fails with [`Error::NamespaceNotFound`](crate::Error::NamespaceNotFound)
    /// if the namespace is unknown.
    fn resolve(&self, namespace: &str, digest: &Digest) -> Result<PartitionInfo>;
}

/// Resolve through any [`PartitionResolver`].
pub fn resolve<R>(resolver: &R, namespace: &str, digest: &Digest) -> Result<PartitionInfo>
where
    R: PartitionResolver + ?Sized,
{
    resolver.resolve(namespace, digest)
}

/// A resolved partition.
///
/// Holds one reference to the owning table. Dropping the info releases it.
#[derive(Debug)]
pub struct PartitionInfo {
    table: Arc<PartitionTable>,
    partition_id: PartitionId,
}

impl PartitionInfo {
    /// Resolve `digest` against a retained table.
    pub fn new(table: Arc<PartitionTable>, digest: &Digest) -> Self {
        let partition_id = partition_id(digest, table.size());
        Self {
            table,
            partition_id,
        }
    }

    pub fn namespace(&self) -> &Namespace {
        self.table.namespace()
    }

    pub fn partition_id(&self) -> PartitionId {
        self.partition_id
    }

    pub fn sc_mode(&self) -> bool {
        self.table.sc_mode()
    }

    /// The resolved partition entry.
    pub fn partition(&self) -> &Partition {
        // Ids are masked to the table size, which is a power of two.
        &self.table.partitions()[self.partition_id as usize]
    }

    pub fn master(&self) -> Option<&NodeRef> {
        self.partition().master.as_ref()
    }

    pub fn prole(&self) -> Option<&NodeRef> {
        self.partition().prole.as_ref()
    }

    pub fn regime(&self) -> Regime {
        self.partition().regime
    }

    /// The table this info keeps alive.
    pub fn table(&self) -> &Arc<PartitionTable> {
        &self.table
    }

    /// Pick the node to send a command to.
    ///
    /// Writes always go to the master. Reads follow `replica`. Inactive nodes
    /// are skipped. `None` means no usable owner is known yet; the caller
    /// decides how to proceed.
    pub fn node(&self, replica: Replica, is_write: bool) -> Option<NodeRef> {
        let partition = self.partition();
        let master = partition.master.as_ref().filter(|n| n.is_active());

        if is_write {
            return master.cloned();
        }

        match replica {
            Replica::Master => master.cloned(),
            Replica::Sequence => master
                .or_else(|| partition.prole.as_ref().filter(|n| n.is_active()))
                .cloned(),
        }
    }
}
