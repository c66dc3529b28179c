//! Node protocol with announce-based escalation suppression.

use crate::backoff::Backoff;
use crate::ordering::{ANNOUNCE_ORD, CAS_FAILURE, CAS_SUCCESS, COUNTER_ORD};
use crate::tree::{NodeProtocol, Snzi};

/// How many backoff iterations an arriver waits on an announced escalation
/// before escalating itself.
const ANNOUNCE_WAIT_LIMIT: usize = 16;

/// Leaf/interior protocol that announces escalations.
///
/// Extends [`Plain`](crate::tree::Plain) with a per-node announce flag.
/// An arriver that finds the counter at zero while the flag is set knows
/// another caller is already escalating to the parent; instead of racing it
/// with a second parent arrive (and a later compensation), it waits up to
/// [`ANNOUNCE_WAIT_LIMIT`] backoff iterations for the counter to turn
/// non-zero. Only if the wait runs dry does it announce and escalate
/// itself.
///
/// Depart clears the flag on the one-to-zero transition and uses a strong
/// CAS: with a weak CAS, a spurious failure at `old_x == 1` would re-run
/// the loop body and store into the flag twice, racing a concurrent
/// arriver's flag set in between.
#[derive(Debug, Clone, Copy)]
pub struct Announced;

impl NodeProtocol for Announced {
    fn node_arrive(tree: &Snzi<Self>, index: usize) {
        let node = tree.node(index);
        let mut parent_arrive_invoked = false;
        let mut old_x = node.count.load(COUNTER_ORD);

        loop {
            if old_x == 0 && !parent_arrive_invoked {
                let mut do_arrive = true;

                if node.announce.load(ANNOUNCE_ORD) {
                    let mut backoff = Backoff::new();
                    for _ in 0..ANNOUNCE_WAIT_LIMIT {
                        #[cfg(all(test, not(loom)))]
                        super::test_hooks::on_announce_wait();

                        old_x = node.count.load(COUNTER_ORD);
                        if old_x != 0 {
                            do_arrive = false;
                            break;
                        }
                        backoff.wait();
                    }
                }

                if do_arrive {
                    node.announce.store(true, ANNOUNCE_ORD);
                    tree.parent_arrive(node.parent);
                    parent_arrive_invoked = true;
                }
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

            if old_x == 1 {
                node.announce.store(false, ANNOUNCE_ORD);
            }

            match node
                .count
                .compare_exchange(old_x, old_x - 1, CAS_SUCCESS, CAS_FAILURE)
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
