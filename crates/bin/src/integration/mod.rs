//! Glue between command-line arguments and the iporisk crates.

pub(crate) mod config;
pub(crate) mod query_input;
