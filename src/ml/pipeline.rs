use tracing::info;

use crate::core::{PredictorResult, StudentFeatures};
use crate::ml::dataset::prepare;
use crate::ml::encoder::encode;
use crate::ml::predictor::predict;
use crate::ml::risk::{NotificationSink, RiskClassifier, RiskLevel};
use crate::ml::trainer::{train_and_evaluate, Metrics, TrainedModel, TrainerConfig};
use crate::storage::RecordStore;
use crate::track_performance;

/// Model and evaluation produced by one training run
#[derive(Debug, Clone)]
pub struct TrainingReport {
    pub model: TrainedModel,
    pub metrics: Metrics,
    pub record_count: usize,
}

/// Predicted score and its risk level
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PredictionResult {
    pub predicted_score: f64,
    pub risk: RiskLevel,
}

/// Store-to-decision scoring for one request. Nothing is cached: every
/// `train` re-reads the store and fits a fresh model.
pub struct ScoringPipeline<'a> {
    store: &'a dyn RecordStore,
    trainer: TrainerConfig,
    classifier: RiskClassifier,
}

impl<'a> ScoringPipeline<'a> {
    pub fn new(store: &'a dyn RecordStore, trainer: TrainerConfig, classifier: RiskClassifier) -> Self {
        Self {
            store,
            trainer,
            classifier,
        }
    }

    /// Fetch all records, prepare them and fit a model.
    pub fn train(&self) -> PredictorResult<TrainingReport> {
        track_performance!("train_model");

        let records = self.store.fetch_all()?;
        let dataset = prepare(&records)?;
        let (model, metrics) = train_and_evaluate(&dataset, &self.trainer);

        Ok(TrainingReport {
            model,
            metrics,
            record_count: records.len(),
        })
    }

    /// Predict and classify one new student.
    pub fn score(
        &self,
        model: &TrainedModel,
        features: &StudentFeatures,
        sink: &dyn NotificationSink,
    ) -> PredictionResult {
        let encoded = encode(features);
        let predicted_score = predict(model, &encoded);
        let risk = self.classifier.assess(predicted_score, sink);

        info!(predicted_score, %risk, "Scored student");
        PredictionResult {
            predicted_score,
            risk,
        }
    }
}
