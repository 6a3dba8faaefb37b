//! Analysis modules.
//!
//! Aggregation over readings and the AQI bucket sets it fills.

pub mod aggregator;
pub mod buckets;

pub use aggregator::*;
pub use buckets::*;
