//! Node layout: cache-line-isolated atomic counters.
//!
//! Every shared atomic in the tree sits on its own cache line. This is not
//! an optimization knob: siblings in the node arena are written by disjoint
//! sets of threads, and letting their counters share a line would serialize
//! those writers on coherence traffic.

use crate::ordering::{COUNTER_ORD, RMW_ORD};
use crate::sync::atomic::{AtomicBool, AtomicU64};

/// Cache line size the node layout is padded to.
pub const CACHE_LINE_SIZE: usize = 64;

/// Wrapper that aligns (and thereby pads) its contents to a cache line.
#[derive(Debug)]
#[repr(align(64))]
pub(crate) struct CacheAligned<T> {
    value: T,
}

// The literal in #[repr(align(..))] cannot name a constant; keep the two in
// sync by construction.
const _: () = assert!(std::mem::align_of::<CacheAligned<u64>>() == CACHE_LINE_SIZE);

impl<T> CacheAligned<T> {
    pub(crate) const fn new(value: T) -> Self {
        Self { value }
    }
}

impl<T> std::ops::Deref for CacheAligned<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.value
    }
}

/// The root of the tree: a single surplus counter.
///
/// Root operations are single atomic instructions. There is no CAS loop and
/// no backoff here; contention on the root is absorbed by the coherence
/// hardware.
#[derive(Debug)]
pub(crate) struct RootNode {
    count: CacheAligned<AtomicU64>,
}

impl RootNode {
    pub(crate) fn new() -> Self {
        Self {
            count: CacheAligned::new(AtomicU64::new(0)),
        }
    }

    #[inline]
    pub(crate) fn arrive(&self) {
        self.count.fetch_add(1, RMW_ORD);
    }

    #[inline]
    pub(crate) fn depart(&self) {
        let previous = self.count.fetch_sub(1, RMW_ORD);
        debug_assert!(previous > 0, "root depart without a matching arrive");
    }

    #[inline]
    pub(crate) fn is_nonzero(&self) -> bool {
        self.count.load(COUNTER_ORD) != 0
    }

    #[inline]
    pub(crate) fn load(&self) -> u64 {
        self.count.load(COUNTER_ORD)
    }

    /// Weak CAS on the surplus counter, for the adaptive direct-arrival
    /// path. Returns the observed value on failure.
    #[inline]
    pub(crate) fn compare_exchange_weak(
        &self,
        current: u64,
        new: u64,
        success: crate::sync::atomic::Ordering,
        failure: crate::sync::atomic::Ordering,
    ) -> Result<u64, u64> {
        self.count.compare_exchange_weak(current, new, success, failure)
    }
}

/// A non-root node of the tree.
///
/// `count` tracks the surplus inside this node's subtree; `announce`
/// signals an escalation in flight (used by the announce-based protocols);
/// `parent` is the level-order index of the parent in the owning arena.
/// Nodes never point at each other: navigation goes through the arena via
/// the parent index.
#[derive(Debug)]
pub(crate) struct TreeNode {
    pub(crate) count: CacheAligned<AtomicU64>,
    pub(crate) announce: CacheAligned<AtomicBool>,
    pub(crate) parent: usize,
}

impl TreeNode {
    pub(crate) fn new(parent: usize) -> Self {
        Self {
            count: CacheAligned::new(AtomicU64::new(0)),
            announce: CacheAligned::new(AtomicBool::new(false)),
            parent,
        }
    }
}
