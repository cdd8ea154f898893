//! Per-namespace partition tables.
//!
//! A [`PartitionTable`] maps every partition id of one namespace to the nodes
//! that currently own it. Tables are built by the tending process, then frozen
//! behind an `Arc` when they are placed in a published collection. From that
//! point on they are only read.
//!
//! # Reference counting
//!
//! The `Arc` strong count is the table's reference count. The collection
//! holding the table owns one reference, and every in-flight request that
//! resolved a partition owns one more. [`PartitionTable::retain`] and
//! [`PartitionTable::release`] are the only ways to take and give back a
//! reference; the table is destroyed exactly once, when the last one is
//! released, and destruction drops its hold on every node it references.

use crate::error::{Error, Result};
use crate::node::{self, NodeRef};
use crate::types::{Namespace, PartitionId, Regime};
use std::sync::Arc;

/// Owners of a single partition.
#[derive(Debug, Clone, Default)]
pub struct Partition {
    /// Node currently primary for the partition. Absent only while the
    /// cluster is converging.
    pub master: Option<NodeRef>,

    /// Node holding a replica. Absent with replication factor 1 or while
    /// unknown.
    pub prole: Option<NodeRef>,

    /// Strong-consistency epoch of this assignment. Never decreases.
    pub regime: Regime,
}

impl Partition {
    /// Whether `node` is master or prole of this partition.
    pub fn references(&self, node: &NodeRef) -> bool {
        node::same_opt(&self.master, node) || node::same_opt(&self.prole, node)
    }

    /// Whether neither owner is known.
    pub fn is_unassigned(&self) -> bool {
        self.master.is_none() && self.prole.is_none()
    }
}

/// Partition map for one namespace.
#[derive(Debug, Clone)]
pub struct PartitionTable {
    namespace: Namespace,
    sc_mode: bool,
    partitions: Box<[Partition]>,
}

impl PartitionTable {
    /// Create a table with `partition_count` unassigned partitions.
    ///
    /// The count must be a non-zero power of two. Allocation failure is
    /// reported rather than aborting so a failed rebuild leaves the published
    /// tables untouched.
    pub fn new(namespace: Namespace, partition_count: u32, sc_mode: bool) -> Result<Self> {
        if !partition_count.is_power_of_two() {
            return Err(Error::InvalidPartitionCount(partition_count));
        }

        let len = partition_count as usize;
        let mut partitions = Vec::new();
        partitions
            .try_reserve_exact(len)
            .map_err(|_| Error::AllocationFailure {
                what: "partitions",
                requested: len,
            })?;
        partitions.resize_with(len, Partition::default);

        Ok(Self {
            namespace,
            sc_mode,
            partitions: partitions.into_boxed_slice(),
        })
    }

    /// Get the namespace this table maps.
    pub fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    /// Whether the namespace runs in strong-consistency mode.
    pub fn sc_mode(&self) -> bool {
        self.sc_mode
    }

    /// Number of partitions. Always a power of two.
    pub fn size(&self) -> u32 {
        self.partitions.len() as u32
    }

    /// Get a partition by id.
    pub fn get(&self, partition_id: PartitionId) -> Option<&Partition> {
        self.partitions.get(partition_id as usize)
    }

    /// All partitions, indexed by id.
    pub fn partitions(&self) -> &[Partition] {
        &self.partitions
    }

    /// Whether `node` is master or prole of any partition.
    pub fn references(&self, node: &NodeRef) -> bool {
        self.partitions.iter().any(|p| p.references(node))
    }

    /// Apply an observed assignment to a table that has not been published.
    ///
    /// In strong-consistency mode an assignment older than the stored regime
    /// is stale and ignored; `Ok(false)` is returned. Otherwise the owners are
    /// replaced and the regime moves to `max(stored, regime)`.
    pub fn update(
        &mut self,
        partition_id: PartitionId,
        master: Option<NodeRef>,
        prole: Option<NodeRef>,
        regime: Regime,
    ) -> Result<bool> {
        let size = self.size();
        let sc_mode = self.sc_mode;
        let partition = self
            .partitions
            .get_mut(partition_id as usize)
            .ok_or(Error::PartitionOutOfRange { partition_id, size })?;

        if sc_mode && regime < partition.regime {
            return Ok(false);
        }

        partition.master = master;
        partition.prole = prole;
        partition.regime = partition.regime.max(regime);
        Ok(true)
    }

    /// Take an additional reference to a shared table.
    ///
    /// Every retain must be balanced by exactly one [`release`](Self::release).
    pub fn retain(self: &Arc<Self>) -> Arc<Self> {
        Arc::clone(self)
    }

    /// Give back a reference. The last release destroys the table.
    pub fn release(self: Arc<Self>) {
        drop(self);
    }

    /// Number of outstanding references to a shared table.
    pub fn ref_count(self: &Arc<Self>) -> usize {
        Arc::strong_count(self)
    }
}

impl Drop for PartitionTable {
    fn drop(&mut self) {
        tracing::trace!(namespace = %self.namespace, "Destroyed partition table");
    }
}
