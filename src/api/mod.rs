//! AirSight REST API access.

pub mod client;
pub mod types;

#[cfg(test)]
pub(crate) mod stub;

pub use client::*;
pub use types::*;
