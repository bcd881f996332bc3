#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/iporisk/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod error;
pub mod query;
pub mod reference;

pub use error::{DataError, Result};
pub use query::{QueryRecord, load_query, parse_query, read_query};
pub use reference::{SUBSECTOR_COLUMN, load_reference, read_reference};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
