// Predictive scoring pipeline

pub mod dataset;
pub mod encoder;
pub mod pipeline;
pub mod predictor;
pub mod risk;
pub mod trainer;

// Expose key types and functions
pub use dataset::{prepare, ColumnMedians, PreparedDataset};
pub use encoder::{encode, EncodedFeatureVector, FEATURE_COUNT, FEATURE_NAMES};
pub use pipeline::{PredictionResult, ScoringPipeline, TrainingReport};
pub use predictor::predict;
pub use risk::{EarlyWarning, NotificationSink, RiskClassifier, RiskLevel, TracingNotifier};
pub use trainer::{train_and_evaluate, FitMethod, Metrics, TrainedModel, TrainerConfig};
