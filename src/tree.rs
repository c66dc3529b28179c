//! The indicator tree: one topology, pluggable node protocol.
//!
//! [`Snzi<P>`] owns the root and an arena of interior/leaf nodes. The two
//! node protocols — [`Plain`] (no contention handling) and [`Announced`]
//! (escalations announced through a per-node flag) — differ only in the
//! bodies of the leaf/interior arrive and depart; topology, dispatch, and
//! the root are shared. The contention-adaptive frontend on top of the
//! announced tree lives in [`crate::adaptive`].
//!
//! # Protocol sketch
//!
//! A caller's arrive lands on its leaf. A node whose counter rises from
//! zero must make its parent's counter non-zero before its own, so the
//! arriver first invokes arrive on the parent, then publishes its own
//! increment with a CAS. If the CAS that finally succeeds saw a non-zero
//! counter, somebody else escalated in the meantime and the speculative
//! parent arrive is compensated with a parent depart. Symmetrically, the
//! depart that drops a counter to zero issues a depart on the parent.
//! `query` reads the root only.

use std::marker::PhantomData;

use crate::node::{RootNode, TreeNode};
use crate::topology::{Topology, TopologyError, ROOT_INDEX};
use crate::tracing_helpers::debug_log;

mod announced;
mod plain;

#[cfg(all(test, not(loom)))]
pub(crate) mod test_hooks;

#[cfg(all(test, feature = "loom", loom))]
mod loom_tests;


pub use announced::Announced;
pub use plain::Plain;

/// Leaf/interior node behavior of an [`Snzi`] tree.
///
/// Implementations operate on nodes by arena index and recurse towards the
/// root through [`Snzi::parent_arrive`] / [`Snzi::parent_depart`]. The two
/// strategies in this crate are [`Plain`] and [`Announced`]; the trait is
/// not meant to be implemented outside it.
pub trait NodeProtocol: Sized {
    /// Arrive at the non-root node `index`.
    fn node_arrive(tree: &Snzi<Self>, index: usize);

    /// Depart from the non-root node `index`.
    fn node_depart(tree: &Snzi<Self>, index: usize);
}

/// A Scalable NonZero Indicator.
///
/// Shared object through which concurrent callers collectively indicate
/// whether arrivals currently outnumber departures. Callers identify
/// themselves with a `tid` in `[0, T)` fixed at construction; `tid`s are
/// spread over the leaves of a perfect K-ary tree so that no single counter
/// sees all the traffic.
///
/// The two aliases [`PlainSnzi`] and [`AnnouncedSnzi`] pick the node
/// protocol; the protocol is fixed at construction and instances of
/// different protocols must not be mixed.
///
/// # Examples
///
/// ```
/// use snzi::AnnouncedSnzi;
///
/// let snzi = AnnouncedSnzi::new(2, 1, 4)?;
///
/// snzi.arrive(0);
/// assert!(snzi.query());
///
/// snzi.depart(0);
/// assert!(!snzi.query());
/// # Ok::<(), snzi::TopologyError>(())
/// ```
#[derive(Debug)]
pub struct Snzi<P: NodeProtocol> {
    shape: Topology,
    root: RootNode,

    // Level-order arena. Slot 0 mirrors the root's position and is never
    // addressed: keeping it lets parent and leaf indices address the arena
    // directly instead of being shifted by one everywhere.
    nodes: Box<[TreeNode]>,

    _protocol: PhantomData<P>,
}

/// Indicator tree with no contention handling at the nodes.
pub type PlainSnzi = Snzi<Plain>;

/// Indicator tree with announce-based escalation suppression.
pub type AnnouncedSnzi = Snzi<Announced>;

impl<P: NodeProtocol> Snzi<P> {
    /// Construct a tree with arity `arity`, height `height`, serving
    /// thread identifiers `0..threads`.
    ///
    /// Construction does not publish the tree to other threads; sharing it
    /// (for example through an `Arc`) is what establishes the
    /// happens-before edge for them.
    ///
    /// # Errors
    ///
    /// Returns a [`TopologyError`] when `arity < 2` or `threads == 0`.
    pub fn new(arity: usize, height: usize, threads: usize) -> Result<Self, TopologyError> {
        let shape = Topology::new(arity, height, threads)?;

        let nodes: Box<[TreeNode]> = (0..shape.total_nodes())
            .map(|index| {
                let parent = if index == ROOT_INDEX { ROOT_INDEX } else { shape.parent_of(index) };
                TreeNode::new(parent)
            })
            .collect();

        debug_log!(
            nodes = shape.total_nodes(),
            leaves = shape.leaf_nodes(),
            threads_per_leaf = shape.threads_per_leaf(),
            "constructed indicator tree"
        );

        Ok(Self {
            shape,
            root: RootNode::new(),
            nodes,
            _protocol: PhantomData,
        })
    }

    /// Declare the presence of caller `tid`.
    ///
    /// `tid` must be in `[0, T)`. Every arrive must eventually be matched
    /// by a [`depart`](Self::depart) from the same `tid`; the tree neither
    /// detects nor reports violations of that contract.
    pub fn arrive(&self, tid: usize) {
        match self.shape.leaf_for_thread(tid) {
            ROOT_INDEX => self.root.arrive(),
            leaf => P::node_arrive(self, leaf),
        }
    }

    /// Declare the departure of caller `tid` after a matching
    /// [`arrive`](Self::arrive).
    pub fn depart(&self, tid: usize) {
        match self.shape.leaf_for_thread(tid) {
            ROOT_INDEX => self.root.depart(),
            leaf => P::node_depart(self, leaf),
        }
    }

    /// Whether arrivals currently outnumber departures.
    ///
    /// Reads only the root. Safe to call concurrently with arrivals and
    /// departures from any thread; has no side effects.
    #[inline]
    #[must_use]
    pub fn query(&self) -> bool {
        self.root.is_nonzero()
    }

    /// The tree's shape and thread-to-leaf assignment.
    #[inline]
    #[must_use]
    pub fn topology(&self) -> &Topology {
        &self.shape
    }

    /// Arrive at `parent`, which is either the root or an interior node.
    #[inline]
    pub(crate) fn parent_arrive(&self, parent: usize) {
        match parent {
            ROOT_INDEX => self.root.arrive(),
            index => P::node_arrive(self, index),
        }
    }

    /// Depart from `parent`, which is either the root or an interior node.
    #[inline]
    pub(crate) fn parent_depart(&self, parent: usize) {
        match parent {
            ROOT_INDEX => self.root.depart(),
            index => P::node_depart(self, index),
        }
    }

    #[inline]
    pub(crate) fn node(&self, index: usize) -> &TreeNode {
        &self.nodes[index]
    }

    #[inline]
    pub(crate) fn root(&self) -> &RootNode {
        &self.root
    }
}

#[cfg(all(test, not(loom)))]
mod tests {
    use super::*;
    use crate::ordering::COUNTER_ORD;
    use std::sync::Arc;
    use std::thread;

    fn send_only<T: Send>(_: T) {}
    fn sync_only<T: Sync>(_: T) {}

    #[test]
    fn is_send() {
        send_only(PlainSnzi::new(2, 1, 4).unwrap());
        send_only(AnnouncedSnzi::new(2, 1, 4).unwrap());
    }

    #[test]
    fn is_sync() {
        sync_only(PlainSnzi::new(2, 1, 4).unwrap());
        sync_only(AnnouncedSnzi::new(2, 1, 4).unwrap());
    }

    #[test]
    fn construction_rejects_bad_parameters() {
        assert!(PlainSnzi::new(1, 0, 4).is_err());
        assert!(AnnouncedSnzi::new(2, 1, 0).is_err());
    }

    #[test]
    fn height_zero_tree_is_a_bare_counter() {
        let snzi = PlainSnzi::new(2, 0, 4).unwrap();
        assert_eq!(snzi.topology().total_nodes(), 1);

        snzi.arrive(0);
        snzi.arrive(1);
        assert!(snzi.query());

        snzi.depart(0);
        snzi.depart(1);
        assert!(!snzi.query());
    }

    #[test]
    fn surplus_is_visible_at_the_root() {
        let snzi = PlainSnzi::new(2, 1, 4).unwrap();

        snzi.arrive(0);
        assert!(snzi.query());

        snzi.depart(0);
        assert!(!snzi.query());
    }

    #[test]
    fn escalation_propagates_through_interior_levels() {
        let snzi = AnnouncedSnzi::new(2, 2, 8).unwrap();
        let leaf = snzi.topology().leaf_for_thread(0);

        snzi.arrive(0);
        assert_eq!(snzi.node(leaf).count.load(COUNTER_ORD), 1);
        assert_eq!(snzi.node(snzi.node(leaf).parent).count.load(COUNTER_ORD), 1);
        assert!(snzi.query());

        // A second arrival on the same leaf must not escalate again.
        snzi.arrive(0);
        assert_eq!(snzi.node(leaf).count.load(COUNTER_ORD), 2);
        assert_eq!(snzi.node(snzi.node(leaf).parent).count.load(COUNTER_ORD), 1);

        snzi.depart(0);
        snzi.depart(0);
        assert!(!snzi.query());
        assert_eq!(snzi.node(leaf).count.load(COUNTER_ORD), 0);
    }

    #[test]
    fn query_is_idempotent() {
        let snzi = PlainSnzi::new(2, 1, 2).unwrap();
        snzi.arrive(1);
        assert_eq!(snzi.query(), snzi.query());
        snzi.depart(1);
        assert_eq!(snzi.query(), snzi.query());
    }

    #[test]
    fn balanced_concurrent_rounds_quiesce_to_zero() {
        const ROUNDS: usize = 1_000;

        let snzi = Arc::new(PlainSnzi::new(2, 1, 4).unwrap());

        let handles: Vec<_> = (0..4)
            .map(|tid| {
                let snzi = Arc::clone(&snzi);
                thread::spawn(move || {
                    for _ in 0..ROUNDS {
                        snzi.arrive(tid);
                        snzi.depart(tid);
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert!(!snzi.query());
    }
}
