pub mod error;
pub mod types;

pub use error::{PredictorError, PredictorResult};
pub use types::{LearningStyle, NewStudent, RollNumber, StudentFeatures, StudentRecord};
