//! Contention-adaptive frontend over the announced tree.
//!
//! Under light contention the whole tree is overhead: a single CAS on the
//! root beats walking a leaf-to-root path. [`AdaptiveSnzi`] therefore
//! starts every caller on a direct root CAS and watches it fail. A caller
//! whose direct arrive accumulates [`ContentionStatus::MAX_FAILURES`]
//! failed CAS attempts flags itself; its next direct depart latches the
//! flag into permanent tree routing. The switch is monotonic: once a caller
//! is on the tree path it never goes back, even if contention subsides.

use crate::backoff::Backoff;
use crate::ordering::{CAS_FAILURE, CAS_SUCCESS};
use crate::topology::{Topology, TopologyError};
use crate::tracing_helpers::trace_log;
use crate::tree::{Announced, Snzi};

/// Per-caller routing state for an [`AdaptiveSnzi`].
///
/// Owned exclusively by one caller and passed by mutable reference into
/// every arrive/depart; it must never be shared between threads. The
/// default state routes directly to the root.
#[derive(Debug, Clone, Default)]
pub struct ContentionStatus {
    use_snzi_in_arrive: bool,
    use_snzi_in_depart: bool,
    use_snzi_tree_flag: bool,
}

impl ContentionStatus {
    /// Failed direct-CAS attempts in a single arrive that mark the caller
    /// for tree routing.
    pub const MAX_FAILURES: u32 = 5;

    /// Fresh state: route directly to the root.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether this caller has switched to tree routing.
    #[inline]
    #[must_use]
    pub fn uses_tree(&self) -> bool {
        self.use_snzi_in_arrive
    }

    /// State of a caller already latched onto the tree path. Test seam.
    #[cfg(test)]
    pub(crate) fn latched() -> Self {
        Self {
            use_snzi_in_arrive: true,
            use_snzi_in_depart: true,
            use_snzi_tree_flag: true,
        }
    }
}

/// Indicator with per-caller adaptive dispatch between a direct root
/// counter and the announced tree.
///
/// Operations take the caller's [`ContentionStatus`] in addition to the
/// `tid`; callers must pass the same status object to matching arrives and
/// departs.
///
/// # Examples
///
/// ```
/// use snzi::{AdaptiveSnzi, ContentionStatus};
///
/// let snzi = AdaptiveSnzi::new(4, 1, 8)?;
/// let mut status = ContentionStatus::new();
///
/// snzi.arrive(3, &mut status);
/// assert!(snzi.query());
///
/// snzi.depart(3, &mut status);
/// assert!(!snzi.query());
/// # Ok::<(), snzi::TopologyError>(())
/// ```
#[derive(Debug)]
pub struct AdaptiveSnzi {
    tree: Snzi<Announced>,
}

impl AdaptiveSnzi {
    /// Construct the underlying tree; see [`Snzi::new`] for the contract.
    ///
    /// # Errors
    ///
    /// Returns a [`TopologyError`] when `arity < 2` or `threads == 0`.
    pub fn new(arity: usize, height: usize, threads: usize) -> Result<Self, TopologyError> {
        Ok(Self {
            tree: Snzi::new(arity, height, threads)?,
        })
    }

    /// Declare the presence of caller `tid`, routed per `status`.
    pub fn arrive(&self, tid: usize, status: &mut ContentionStatus) {
        if !status.use_snzi_in_arrive {
            self.arrive_directly(status);
            return;
        }

        self.tree.arrive(tid);
    }

    /// Declare the departure of caller `tid`, routed per `status`.
    pub fn depart(&self, tid: usize, status: &mut ContentionStatus) {
        if !status.use_snzi_in_depart {
            self.depart_directly(status);
            return;
        }

        self.tree.depart(tid);
    }

    /// Whether arrivals currently outnumber departures.
    #[inline]
    #[must_use]
    pub fn query(&self) -> bool {
        self.tree.query()
    }

    /// The underlying tree's shape.
    #[inline]
    #[must_use]
    pub fn topology(&self) -> &Topology {
        self.tree.topology()
    }

    /// Contention-tracking arrive on the root counter.
    fn arrive_directly(&self, status: &mut ContentionStatus) {
        let root = self.tree.root();
        let mut old_x = root.load();
        let mut backoff = Backoff::new();
        let mut failures = 0u32;

        while let Err(current) = root.compare_exchange_weak(old_x, old_x + 1, CAS_SUCCESS, CAS_FAILURE)
        {
            old_x = current;
            failures += 1;
            backoff.wait();
        }

        if failures >= ContentionStatus::MAX_FAILURES {
            status.use_snzi_tree_flag = true;
        }
    }

    /// Direct depart; latches tree routing if the arrive side flagged
    /// contention.
    fn depart_directly(&self, status: &mut ContentionStatus) {
        self.tree.root().depart();

        if status.use_snzi_tree_flag {
            status.use_snzi_in_arrive = true;
            status.use_snzi_in_depart = true;
            trace_log!("caller switched from direct root access to tree routing");
        }
    }
}
