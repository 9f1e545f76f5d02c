//! Batch processing: per-group fix resolution and group leases

pub mod aggregator;
pub mod locks;

pub use aggregator::FixAggregator;
pub use locks::{GroupLease, GroupLocks};
