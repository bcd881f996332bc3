//! Sub-sector classification of the reference universe.

pub mod subsector;

pub use subsector::{Subsector, UnknownSubsector};
