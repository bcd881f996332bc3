#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/iporisk/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod export;
pub mod report;

pub use export::{ExportError, ExportFormat, Exporter, MetricOutcome, ProjectionExport};
pub use report::{DEFAULT_PRECISION, Report, ReportBuilder, ReportError, ReportLine};
