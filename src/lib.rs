//! # snzi
//!
//! A Scalable NonZero Indicator: a shared object many threads use to
//! collectively indicate whether "arrive" events currently outnumber
//! "depart" events, without serializing every caller on one counter.
//!
//! The indicator is a perfect K-ary tree of cache-line-isolated atomic
//! counters. Callers arrive and depart at a leaf chosen by their thread
//! identifier; a node whose counter moves between zero and non-zero
//! escalates to its parent, so the root counter is non-zero exactly while
//! some subtree holds a surplus. `query` reads the root only.
//!
//! ## Variants
//!
//! - [`PlainSnzi`] - the baseline lock-free node protocol.
//! - [`AnnouncedSnzi`] - adds a per-node announce bit so concurrent
//!   arrivers on the same node do not race redundant escalations.
//! - [`AdaptiveSnzi`] - starts every caller on a single direct root CAS
//!   and moves it onto the tree once its CAS loop keeps failing; callers
//!   carry their routing state in a [`ContentionStatus`].
//!
//! ## Guarantees
//!
//! Arrive, depart and query are linearizable and lock-free (not
//! wait-free). Departs must be matched to prior arrives by the same caller
//! identifier; the tree does not detect misuse. Construction is the only
//! fallible operation.

pub mod adaptive;
pub mod backoff;
mod node;
pub mod ordering;
mod sync;
pub mod topology;
mod tracing_helpers;
pub mod tree;

pub use adaptive::{AdaptiveSnzi, ContentionStatus};
pub use backoff::Backoff;
pub use node::CACHE_LINE_SIZE;
pub use topology::{Topology, TopologyError};
pub use tree::{Announced, AnnouncedSnzi, NodeProtocol, Plain, PlainSnzi, Snzi};
