//! The collection of partition tables for all known namespaces.
//!
//! [`PartitionTables`] is an immutable snapshot. The tending process builds a
//! replacement with [`PartitionTablesBuilder`] and the cluster publishes it
//! with a single atomic swap. Tables that did not change between snapshots
//! are shared rather than copied; a table that did change is copied on first
//! write, so a published table is never mutated.

use crate::error::{Error, Result};
use crate::node::NodeRef;
use crate::partitioning::table::PartitionTable;
use crate::types::{Namespace, PartitionId, Regime};
use std::sync::Arc;

/// Reference counted set of partition tables, one per namespace.
#[derive(Debug)]
pub struct PartitionTables {
    /// Publication generation, stamped by the cluster when published. Zero
    /// until then.
    generation: u64,

    tables: Vec<Arc<PartitionTable>>,
}

impl PartitionTables {
    /// Create an empty collection with room for `capacity` namespaces.
    pub fn with_capacity(capacity: usize) -> Result<Self> {
        Ok(Self {
            generation: 0,
            tables: reserve_slots(capacity)?,
        })
    }

    /// Get the publication generation.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub(crate) fn stamp_generation(&mut self, generation: u64) {
        self.generation = generation;
    }

    /// Number of namespaces.
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Look up the table for a namespace by exact, case-sensitive match.
    ///
    /// The returned reference borrows the collection. Callers that need the
    /// table beyond that borrow must [`retain`](PartitionTable::retain) it.
    pub fn get(&self, namespace: &str) -> Option<&Arc<PartitionTable>> {
        self.tables
            .iter()
            .find(|t| t.namespace().as_str() == namespace)
    }

    /// Iterate over all tables.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<PartitionTable>> {
        self.tables.iter()
    }

    /// Namespaces present in this collection.
    pub fn namespaces(&self) -> Vec<Namespace> {
        self.tables.iter().map(|t| t.namespace().clone()).collect()
    }

    /// Whether `node` is master or prole of any partition of any namespace.
    ///
    /// Scans every entry; intended for topology changes, not request paths.
    pub fn find_node(&self, node: &NodeRef) -> bool {
        self.tables.iter().any(|t| t.references(node))
    }

    /// Take an additional reference to a shared collection.
    pub fn retain(self: &Arc<Self>) -> Arc<Self> {
        Arc::clone(self)
    }

    /// Give back a reference. The last release destroys the collection and
    /// releases its reference to every table.
    pub fn release(self: Arc<Self>) {
        drop(self);
    }

    /// Number of outstanding references to a shared collection.
    pub fn ref_count(self: &Arc<Self>) -> usize {
        Arc::strong_count(self)
    }
}

impl Drop for PartitionTables {
    fn drop(&mut self) {
        tracing::trace!(
            generation = self.generation,
            namespaces = self.tables.len(),
            "Destroyed partition tables"
        );
    }
}

/// Builds the next [`PartitionTables`] snapshot.
#[derive(Debug)]
pub struct PartitionTablesBuilder {
    tables: Vec<Arc<PartitionTable>>,
    stale_regimes: u64,

    /// Partition count every table must have, when fixed for the cluster.
    partition_count: Option<u32>,
}

impl PartitionTablesBuilder {
    /// Start an empty collection.
    pub fn new(capacity: usize) -> Result<Self> {
        Ok(Self {
            tables: reserve_slots(capacity)?,
            stale_regimes: 0,
            partition_count: None,
        })
    }

    /// Start from a published collection. Every table is shared until it is
    /// modified.
    pub fn from_tables(current: &PartitionTables) -> Result<Self> {
        let mut tables = reserve_slots(current.tables.len())?;
        tables.extend(current.tables.iter().map(PartitionTable::retain));

        Ok(Self {
            tables,
            stale_regimes: 0,
            partition_count: None,
        })
    }

    /// Require every table to have `partition_count` partitions.
    pub fn with_partition_count(mut self, partition_count: u32) -> Self {
        self.partition_count = Some(partition_count);
        self
    }

    /// Get the table for a namespace, for reading.
    pub fn get(&self, namespace: &str) -> Option<&Arc<PartitionTable>> {
        self.tables
            .iter()
            .find(|t| t.namespace().as_str() == namespace)
    }

    /// Insert a fully built table, replacing any table for the same namespace.
    pub fn insert_table(&mut self, table: PartitionTable) -> Result<()> {
        self.check_partition_count(table.size())?;
        let table = Arc::new(table);
        match self.position(table.namespace().as_str()) {
            Some(idx) => self.tables[idx] = table,
            None => {
                self.tables
                    .try_reserve(1)
                    .map_err(|_| Error::AllocationFailure {
                        what: "table slots",
                        requested: self.tables.len() + 1,
                    })?;
                self.tables.push(table);
            }
        }
        Ok(())
    }

    /// Get a writable table for a namespace, creating it if needed.
    ///
    /// An existing table is reused when its size and mode match; if it is
    /// still shared with a published collection it is copied first. A size
    /// or mode change replaces it with a fresh table.
    pub fn table_mut(
        &mut self,
        namespace: &Namespace,
        partition_count: u32,
        sc_mode: bool,
    ) -> Result<&mut PartitionTable> {
        self.check_partition_count(partition_count)?;
        let idx = match self.position(namespace.as_str()) {
            Some(idx)
                if self.tables[idx].size() == partition_count
                    && self.tables[idx].sc_mode() == sc_mode =>
            {
                idx
            }
            existing => {
                if let Some(old) = existing.map(|idx| &self.tables[idx]) {
                    tracing::info!(
                        namespace = %namespace,
                        old_size = old.size(),
                        new_size = partition_count,
                        old_sc_mode = old.sc_mode(),
                        sc_mode,
                        "Rebuilding partition table"
                    );
                }
                self.insert_table(PartitionTable::new(
                    namespace.clone(),
                    partition_count,
                    sc_mode,
                )?)?;
                self.position(namespace.as_str())
                    .ok_or_else(|| Error::NamespaceNotFound(namespace.to_string()))?
            }
        };

        Ok(Arc::make_mut(&mut self.tables[idx]))
    }

    /// Apply one partition assignment, creating the namespace table if needed.
    ///
    /// Returns `false` when a strong-consistency table rejected a stale regime.
    pub fn update_partition(
        &mut self,
        namespace: &Namespace,
        partition_count: u32,
        sc_mode: bool,
        update: PartitionUpdate,
    ) -> Result<bool> {
        let table = self.table_mut(namespace, partition_count, sc_mode)?;
        let applied = table.update(
            update.partition_id,
            update.master,
            update.prole,
            update.regime,
        )?;

        if !applied {
            self.stale_regimes += 1;
            tracing::debug!(
                namespace = %namespace,
                partition_id = update.partition_id,
                regime = update.regime,
                "Ignored stale regime"
            );
        }
        Ok(applied)
    }

    /// Drop a namespace. Returns whether it was present.
    pub fn remove_namespace(&mut self, namespace: &str) -> bool {
        match self.position(namespace) {
            Some(idx) => {
                self.tables.swap_remove(idx);
                true
            }
            None => false,
        }
    }

    /// Number of assignments rejected for a stale regime so far.
    pub fn stale_regimes(&self) -> u64 {
        self.stale_regimes
    }

    /// Freeze into an immutable collection ready to publish.
    pub fn build(self) -> PartitionTables {
        PartitionTables {
            generation: 0,
            tables: self.tables,
        }
    }

    fn check_partition_count(&self, partition_count: u32) -> Result<()> {
        match self.partition_count {
            Some(expected) if expected != partition_count => {
                Err(Error::InvalidPartitionCount(partition_count))
            }
            _ => Ok(()),
        }
    }

    fn position(&self, namespace: &str) -> Option<usize> {
        self.tables
            .iter()
            .position(|t| t.namespace().as_str() == namespace)
    }
}

/// One observed partition assignment, as reported by the cluster.
#[derive(Debug, Clone, Default)]
pub struct PartitionUpdate {
    pub partition_id: PartitionId,
    pub master: Option<NodeRef>,
    pub prole: Option<NodeRef>,
    pub regime: Regime,
}

impl PartitionUpdate {
    /// Create an update with only a master.
    pub fn new(partition_id: PartitionId, master: Option<NodeRef>) -> Self {
        Self {
            partition_id,
            master,
            ..Default::default()
        }
    }

    /// Set the prole.
    pub fn with_prole(mut self, prole: Option<NodeRef>) -> Self {
        self.prole = prole;
        self
    }

    /// Set the regime.
    pub fn with_regime(mut self, regime: Regime) -> Self {
        self.regime = regime;
        self
    }
}

fn reserve_slots(capacity: usize) -> Result<Vec<Arc<PartitionTable>>> {
    let mut tables = Vec::new();
    tables
        .try_reserve_exact(capacity)
        .map_err(|_| Error::AllocationFailure {
            what: "table slots",
            requested: capacity,
        })?;
    Ok(tables)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::Node;

    fn ns(name: &str) -> Namespace {
        Namespace::new(name).unwrap()
    }

    fn node(name: &str) -> NodeRef {
        Node::new(name, "127.0.0.1:3000".parse().unwrap())
    }

    fn collection(names: &[&str]) -> PartitionTables {
        let mut builder = PartitionTablesBuilder::new(names.len()).unwrap();
        for name in names {
            builder
                .insert_table(PartitionTable::new(ns(name), 4, false).unwrap())
                .unwrap();
        }
        builder.build()
    }

    #[test]
    fn test_get() {
        let tables = collection(&["test", "bar"]);
        assert_eq!(tables.len(), 2);
        assert!(tables.get("test").is_some());
        assert!(tables.get("bar").is_some());
        assert!(tables.get("missing").is_none());
        assert!(tables.get("TEST").is_none());
    }

    #[test]
    fn test_empty() {
        let tables = PartitionTables::with_capacity(4).unwrap();
        assert!(tables.is_empty());
        assert_eq!(tables.generation(), 0);
        assert!(tables.get("test").is_none());
        assert!(!tables.find_node(&node("A")));
    }

    #[test]
    fn test_find_node() {
        let a = node("A");
        let b = node("B");
        let c = node("C");
        let mut builder = PartitionTablesBuilder::new(2).unwrap();
        builder
            .update_partition(&ns("one"), 4, false, PartitionUpdate::new(1, Some(a.clone())))
            .unwrap();
        builder
            .update_partition(
                &ns("two"),
                4,
                false,
                PartitionUpdate::new(2, None).with_prole(Some(b.clone())),
            )
            .unwrap();
        let tables = builder.build();

        assert!(tables.find_node(&a));
        assert!(tables.find_node(&b));
        assert!(!tables.find_node(&c));
    }

    #[test]
    fn test_release_collection_releases_tables() {
        let tables = Arc::new(collection(&["test"]));
        let table = tables.get("test").unwrap().retain();
        let weak = Arc::downgrade(&table);
        assert_eq!(table.ref_count(), 2);

        tables.release();
        assert_eq!(table.ref_count(), 1);
        assert!(weak.upgrade().is_some());

        table.release();
        assert!(weak.upgrade().is_none());
    }

    #[test]
    fn test_rebuild_shares_unchanged_tables() {
        let a = node("A");
        let current = collection(&["test", "bar"]);
        let mut builder = PartitionTablesBuilder::from_tables(&current).unwrap();
        builder
            .update_partition(&ns("test"), 4, false, PartitionUpdate::new(0, Some(a.clone())))
            .unwrap();
        let next = builder.build();

        assert!(Arc::ptr_eq(
            current.get("bar").unwrap(),
            next.get("bar").unwrap()
        ));
        assert!(!Arc::ptr_eq(
            current.get("test").unwrap(),
            next.get("test").unwrap()
        ));

        // The published table was copied, not mutated.
        assert!(current.get("test").unwrap().get(0).unwrap().master.is_none());
        assert!(next.get("test").unwrap().get(0).unwrap().references(&a));
    }

    #[test]
    fn test_regime_carries_across_rebuilds() {
        let a = node("A");
        let b = node("B");
        let test = ns("test");

        let mut builder = PartitionTablesBuilder::new(1).unwrap();
        let update = PartitionUpdate::new(3, Some(a.clone())).with_regime(9);
        builder.update_partition(&test, 4, true, update).unwrap();
        let first = builder.build();

        let mut builder = PartitionTablesBuilder::from_tables(&first).unwrap();
        let update = PartitionUpdate::new(3, Some(b.clone())).with_regime(8);
        let applied = builder.update_partition(&test, 4, true, update).unwrap();
        assert!(!applied);
        assert_eq!(builder.stale_regimes(), 1);
        let second = builder.build();

        let partition = second.get("test").unwrap().get(3).unwrap().clone();
        assert!(partition.references(&a));
        assert_eq!(partition.regime, 9);
    }

    #[test]
    fn test_mode_change_forces_fresh_table() {
        let a = node("A");
        let test = ns("test");
        let mut builder = PartitionTablesBuilder::new(1).unwrap();
        builder
            .update_partition(&test, 4, false, PartitionUpdate::new(0, Some(a.clone())))
            .unwrap();

        let table = builder.table_mut(&test, 4, true).unwrap();
        assert!(table.sc_mode());
        assert!(table.get(0).unwrap().is_unassigned());

        let table = builder.table_mut(&test, 8, true).unwrap();
        assert_eq!(table.size(), 8);
        assert_eq!(builder.build().len(), 1);
    }

    #[test]
    fn test_remove_namespace() {
        let current = collection(&["test", "bar"]);
        let mut builder = PartitionTablesBuilder::from_tables(&current).unwrap();
        assert!(builder.remove_namespace("bar"));
        assert!(!builder.remove_namespace("bar"));

        let next = builder.build();
        assert_eq!(next.namespaces(), vec![ns("test")]);
        assert_eq!(current.len(), 2);
    }

    #[test]
    fn test_allocation_failure() {
        assert!(matches!(
            PartitionTables::with_capacity(usize::MAX),
            Err(Error::AllocationFailure {
                what: "table slots",
                ..
            })
        ));
        assert!(matches!(
            PartitionTablesBuilder::new(usize::MAX),
            Err(Error::AllocationFailure { .. })
        ));
    }

    #[test]
    fn test_fixed_partition_count() {
        let test = ns("test");
        let mut builder = PartitionTablesBuilder::new(1)
            .unwrap()
            .with_partition_count(4);

        assert_eq!(
            builder
                .update_partition(&test, 8, false, PartitionUpdate::new(0, None))
                .unwrap_err(),
            Error::InvalidPartitionCount(8)
        );
        assert_eq!(
            builder
                .insert_table(PartitionTable::new(test.clone(), 16, false).unwrap())
                .unwrap_err(),
            Error::InvalidPartitionCount(16)
        );
        assert!(builder
            .update_partition(&test, 4, false, PartitionUpdate::new(0, None))
            .unwrap());
        assert_eq!(builder.build().len(), 1);
    }

    #[test]
    fn test_build_is_unstamped() {
        let current = collection(&["test"]);
        let next = PartitionTablesBuilder::from_tables(&current).unwrap().build();
        assert_eq!(next.generation(), 0);
    }
}
