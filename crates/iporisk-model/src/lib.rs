#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/iporisk/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod covariance;
pub mod dataset;
pub mod distance;
pub mod error;
pub mod fuzzy;
pub mod peers;
pub mod projection;
pub mod schema;

// Re-export main types
pub use covariance::{CovarianceConfig, CovarianceKind, CovarianceModel};
pub use dataset::{QueryVector, ReferenceDataset, ReferenceRow};
pub use distance::{Distances, compute_distances};
pub use error::{Result, RiskError, SchemaOrigin};
pub use fuzzy::{MembershipMode, TriangularMembership, to_similarity};
pub use peers::{DEFAULT_TOP_K, PeerMatch, PeerSelection, select_and_aggregate, select_peers};
pub use projection::{MetricEstimate, ProjectionConfig, RiskProjection, RiskProjector, project_risk};
pub use schema::{Attribute, AttributeValues, MetricValues, RiskMetric};
