//! Loom models for the tree protocol.
//!
//! Loom explores the possible interleavings of the real protocol: the
//! crate's atomics come from [`crate::sync`], which re-exports loom's types
//! under this configuration, so these models run the production arrive and
//! depart bodies, not simplified copies.
//!
//! Run with: `RUSTFLAGS="--cfg loom" cargo test --features loom --lib`

use loom::sync::Arc;
use loom::thread;

use crate::tree::{AnnouncedSnzi, PlainSnzi};

/// Any interleaving of balanced pairs from two callers on distinct leaves
/// quiesces with no surplus.
#[test]
fn loom_balanced_pairs_quiesce() {
    loom::model(|| {
        let snzi = Arc::new(PlainSnzi::new(2, 1, 4).unwrap());

        let s1 = Arc::clone(&snzi);
        let t1 = thread::spawn(move || {
            s1.arrive(0);
            s1.depart(0);
        });

        let s2 = Arc::clone(&snzi);
        let t2 = thread::spawn(move || {
            s2.arrive(2);
            s2.depart(2);
        });

        t1.join().unwrap();
        t2.join().unwrap();

        assert!(!snzi.query());
    });
}

/// Two callers sharing one leaf cannot lose an escalation: while either is
/// between arrive and depart, a surplus is observable, and the last depart
/// clears it.
#[test]
fn loom_shared_leaf_balances() {
    loom::model(|| {
        let snzi = Arc::new(PlainSnzi::new(2, 1, 4).unwrap());

        let s1 = Arc::clone(&snzi);
        let t1 = thread::spawn(move || {
            s1.arrive(0);
            s1.depart(0);
        });

        let s2 = Arc::clone(&snzi);
        let t2 = thread::spawn(move || {
            s2.arrive(1);
            s2.depart(1);
        });

        t1.join().unwrap();
        t2.join().unwrap();

        assert!(!snzi.query());
    });
}

/// A completed arrive is visible to query before its depart.
#[test]
fn loom_surplus_visible_after_arrive() {
    loom::model(|| {
        let snzi = Arc::new(PlainSnzi::new(2, 1, 2).unwrap());

        let s1 = Arc::clone(&snzi);
        let t1 = thread::spawn(move || {
            s1.arrive(0);
        });

        t1.join().unwrap();
        assert!(snzi.query());

        snzi.depart(0);
        assert!(!snzi.query());
    });
}

/// The announce flag must not suppress a required escalation: balanced
/// pairs through the announced protocol also quiesce under every
/// interleaving, including those where one arriver waits on the other's
/// announce.
#[test]
fn loom_announced_balanced_pairs_quiesce() {
    loom::model(|| {
        let snzi = Arc::new(AnnouncedSnzi::new(2, 1, 4).unwrap());

        let s1 = Arc::clone(&snzi);
        let t1 = thread::spawn(move || {
            s1.arrive(0);
            s1.depart(0);
        });

        let s2 = Arc::clone(&snzi);
        let t2 = thread::spawn(move || {
            s2.arrive(1);
            s2.depart(1);
        });

        t1.join().unwrap();
        t2.join().unwrap();

        assert!(!snzi.query());
    });
}
