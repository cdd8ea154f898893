//! Configuration types for partition routing.

use crate::error::{Error, Result};
use crate::partitioning::Replica;
use serde::{Deserialize, Serialize};

/// Default partition count per namespace.
pub const DEFAULT_PARTITIONS: u32 = 4096;

/// Main configuration for a cluster routing context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterConfig {
    /// Number of partitions per namespace. Fixed for the cluster, must be a
    /// power of two.
    pub n_partitions: u32,

    /// Initial number of namespace slots reserved in a collection.
    pub namespace_capacity: usize,

    /// Default replica policy for reads.
    pub replica: Replica,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            n_partitions: DEFAULT_PARTITIONS,
            namespace_capacity: 8,
            replica: Replica::Sequence,
        }
    }
}

impl ClusterConfig {
    /// Create a new configuration with the given partition count.
    pub fn new(n_partitions: u32) -> Self {
        Self {
            n_partitions,
            ..Default::default()
        }
    }

    /// Set the partition count.
    pub fn with_partitions(mut self, n_partitions: u32) -> Self {
        self.n_partitions = n_partitions;
        self
    }

    /// Set the initial namespace capacity.
    pub fn with_namespace_capacity(mut self, capacity: usize) -> Self {
        self.namespace_capacity = capacity;
        self
    }

    /// Set the default replica policy.
    pub fn with_replica(mut self, replica: Replica) -> Self {
        self.replica = replica;
        self
    }

    /// Check the configuration for values the router cannot work with.
    pub fn validate(&self) -> Result<()> {
        if !self.n_partitions.is_power_of_two() {
            return Err(Error::InvalidPartitionCount(self.n_partitions));
        }
        if self.namespace_capacity == 0 {
            return Err(Error::Config("namespace_capacity must be at least 1".into()));
        }
        Ok(())
    }
}
