//! Cluster node handles.
//!
//! A node is owned by the node-lifecycle layer and shared with the routing
//! tables through [`NodeRef`]. Cloning a `NodeRef` retains the node; dropping
//! it releases the hold. Tables never assume a node outlives them.

use std::fmt;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared, reference counted handle to a cluster node.
pub type NodeRef = Arc<Node>;

/// A server node known to the client.
pub struct Node {
    /// Server-assigned node name.
    name: String,

    /// Address used to reach the node.
    address: SocketAddr,

    /// Cleared when the node drops out of discovery.
    active: AtomicBool,
}

impl Node {
    /// Create a new active node handle.
    pub fn new(name: impl Into<String>, address: SocketAddr) -> NodeRef {
        Arc::new(Self {
            name: name.into(),
            address,
            active: AtomicBool::new(true),
        })
    }

    /// Get the node name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the node address.
    pub fn address(&self) -> SocketAddr {
        self.address
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    /// Mark the node as no longer part of the discovered cluster.
    ///
    /// Tables that still reference the node keep it alive until they are
    /// released.
    pub fn deactivate(&self) {
        self.active.store(false, Ordering::Release);
    }

    /// Handle identity. Two handles are the same node only if they point at
    /// the same allocation.
    pub fn same(a: &NodeRef, b: &NodeRef) -> bool {
        Arc::ptr_eq(a, b)
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("name", &self.name)
            .field("address", &self.address)
            .field("active", &self.is_active())
            .finish()
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.name, self.address)
    }
}

/// Compare two optional handles by identity.
pub(crate) fn same_opt(a: &Option<NodeRef>, b: &NodeRef) -> bool {
    a.as_ref().is_some_and(|n| Node::same(n, b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity() {
        let a = Node::new("BB9000000000001", "127.0.0.1:3000".parse().unwrap());
        let b = Node::new("BB9000000000001", "127.0.0.1:3000".parse().unwrap());

        assert!(Node::same(&a, &a.clone()));
        assert!(!Node::same(&a, &b));
        assert!(same_opt(&Some(a.clone()), &a));
        assert!(!same_opt(&None, &a));
    }

    #[test]
    fn test_deactivate() {
        let node = Node::new("A", "127.0.0.1:3000".parse().unwrap());
        assert!(node.is_active());
        node.deactivate();
        assert!(!node.is_active());
        assert_eq!(node.to_string(), "A 127.0.0.1:3000");
    }
}
