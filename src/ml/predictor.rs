use ndarray::ArrayView1;

use crate::ml::encoder::EncodedFeatureVector;
use crate::ml::trainer::{linear_combination, TrainedModel};

/// Predict a score for one encoded student. Missing slots are filled with
/// the medians of the dataset the model was trained on.
pub fn predict(model: &TrainedModel, features: &EncodedFeatureVector) -> f64 {
    let dense = features.impute(&model.medians.features);
    linear_combination(model, ArrayView1::from(&dense[..]))
}
