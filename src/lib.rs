//! Student performance records, exam score prediction and early warnings.
//!
//! Records live in a [`storage::RecordStore`]. Each prediction request
//! re-reads every record, fits a fresh linear model through
//! [`ml::ScoringPipeline`] and flags students whose predicted score falls
//! below the configured threshold.

pub mod cli;
pub mod config;
pub mod core;
pub mod ml;
pub mod monitoring;
pub mod storage;

pub use crate::config::PredictorConfig;
pub use crate::core::{PredictorError, PredictorResult};
