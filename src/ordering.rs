//! Standard memory orderings for the tree protocol.
//!
//! These constants ensure consistent ordering usage across the codebase and
//! make the intent clear at each access point. The protocol is specified
//! sequentially consistent: every counter and announce-flag access below is
//! `SeqCst`. An implementation may relax an individual site to
//! acquire/release only with a safety argument for that site; none of the
//! constants here have been relaxed.

use crate::sync::atomic::Ordering;

/// Ordering for plain loads of a node counter (snapshot reads and `query`).
pub const COUNTER_ORD: Ordering = Ordering::SeqCst;

/// Ordering for the read-modify-write root operations (`fetch_add`,
/// `fetch_sub`).
pub const RMW_ORD: Ordering = Ordering::SeqCst;

/// Ordering for a successful counter CAS. The 0→1 and 1→0 transitions are
/// the linearization points of Arrive and Depart.
pub const CAS_SUCCESS: Ordering = Ordering::SeqCst;

/// Ordering for a failed counter CAS. The returned value becomes the next
/// loop snapshot.
pub const CAS_FAILURE: Ordering = Ordering::SeqCst;

/// Ordering for loads and stores of a node's announce flag.
pub const ANNOUNCE_ORD: Ordering = Ordering::SeqCst;
