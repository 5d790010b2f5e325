//! Data model and ranking metrics for offline learning-to-rank evaluation.

pub mod features;
pub mod judgments;
pub mod metrics;
pub mod params;
pub mod results;

mod error;

pub use error::{Error, Result};
pub use features::{FeatureId, FeatureRow, FeatureSchema, FeatureTable, PairKey};
pub use judgments::{Qrel, Qrels};
pub use metrics::ConfusionMetrics;
pub use params::{Dimension, Domain, ParamValue, Params, SearchSpace};
pub use results::{RankedHit, ScoredResult};
