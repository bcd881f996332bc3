#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/iporisk/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod universe;

// Re-export main types from sub-crates
pub use iporisk_data as data;
pub use iporisk_model as model;
pub use iporisk_output as output;

// Re-export common universe types
pub use universe::Subsector;

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
