//! Node protocol without contention handling.

use crate::ordering::{CAS_FAILURE, CAS_SUCCESS, COUNTER_ORD};
use crate::tree::{NodeProtocol, Snzi};

/// The baseline leaf/interior protocol: speculative parent arrive before
/// the zero-to-one transition, weak-CAS publication, trailing compensation.
///
/// # Why the speculative parent call is safe
///
/// `parent_arrive_invoked` is sticky for the duration of the call, so the
/// parent arrive is issued at most once no matter how often the CAS fails —
/// spuriously or not. The compensation predicate keys off the snapshot the
/// *winning* CAS consumed: if that snapshot was zero, this call performed
/// the zero-to-one transition and the parent arrive is the real escalation;
/// if it was non-zero, someone else holds the subtree non-zero and the
/// speculative parent arrive is undone with exactly one parent depart.
/// Either way the parent counter over-approximates the child's non-zero
/// status at all times and matches it at quiescence.
#[derive(Debug, Clone, Copy)]
pub struct Plain;

impl NodeProtocol for Plain {
    fn node_arrive(tree: &Snzi<Self>, index: usize) {
        let node = tree.node(index);
        let mut parent_arrive_invoked = false;
        let mut old_x = node.count.load(COUNTER_ORD);

        loop {
            if old_x == 0 && !parent_arrive_invoked {
                tree.parent_arrive(node.parent);
                parent_arrive_invoked = true;
            }

            match node
                .count
                .compare_exchange_weak(old_x, old_x + 1, CAS_SUCCESS, CAS_FAILURE)
            {
                Ok(_) => break,
                Err(current) => old_x = current,
            }
        }

        if parent_arrive_invoked && old_x != 0 {
            tree.parent_depart(node.parent);
        }
    }

    fn node_depart(tree: &Snzi<Self>, index: usize) {
        let node = tree.node(index);
        let mut old_x = node.count.load(COUNTER_ORD);

        loop {
            debug_assert!(old_x > 0, "depart without a matching arrive");

            match node
                .count
                .compare_exchange_weak(old_x, old_x - 1, CAS_SUCCESS, CAS_FAILURE)
            {
                Ok(_) => break,
                Err(current) => old_x = current,
            }
        }

        if old_x == 1 {
            tree.parent_depart(node.parent);
        }
    }
}

#[cfg(all(test, not(loom)))]
mod tests {
    use crate::ordering::COUNTER_ORD;
    use crate::tree::PlainSnzi;

    #[test]
    fn interleaved_callers_on_one_leaf_escalate_once() {
        let snzi = PlainSnzi::new(2, 1, 4).unwrap();
        let leaf = snzi.topology().leaf_for_thread(0);

        // tids 0 and 1 share leaf 1; only the first arrival escalates.
        snzi.arrive(0);
        snzi.arrive(1);
        assert_eq!(snzi.node(leaf).count.load(COUNTER_ORD), 2);
        assert_eq!(snzi.root().load(), 1);

        snzi.depart(0);
        assert!(snzi.query());

        snzi.depart(1);
        assert!(!snzi.query());
    }

    #[test]
    fn distinct_leaves_contribute_independently() {
        let snzi = PlainSnzi::new(2, 1, 4).unwrap();

        snzi.arrive(0); // leaf 1
        snzi.arrive(2); // leaf 2
        assert_eq!(snzi.root().load(), 2);

        snzi.depart(0);
        assert!(snzi.query());

        snzi.depart(2);
        assert!(!snzi.query());
    }
}
