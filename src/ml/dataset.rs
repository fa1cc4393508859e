use ndarray::{Array1, Array2};
use tracing::{debug, warn};

use crate::core::{PredictorError, PredictorResult, StudentRecord};
use crate::ml::encoder::{encode, EncodedFeatureVector, FEATURE_COUNT, FEATURE_NAMES};

/// Smallest dataset that can be split into a train and a test side
pub const MIN_RECORDS: usize = 2;

/// Column medians computed when a dataset was prepared
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColumnMedians {
    pub features: [f64; FEATURE_COUNT],
    pub target: f64,
}

/// Dense, fully imputed training data
#[derive(Debug, Clone)]
pub struct PreparedDataset {
    pub features: Array2<f64>,
    pub targets: Array1<f64>,
    pub medians: ColumnMedians,
}

impl PreparedDataset {
    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}

/// Encode every record and impute missing cells with column medians.
pub fn prepare(records: &[StudentRecord]) -> PredictorResult<PreparedDataset> {
    if records.len() < MIN_RECORDS {
        return Err(PredictorError::InsufficientData(format!(
            "{} record(s) available, at least {} are needed to split the data",
            records.len(),
            MIN_RECORDS
        )));
    }

    let encoded: Vec<EncodedFeatureVector> = records
        .iter()
        .map(|record| encode(&record.features))
        .collect();

    let mut feature_medians = [0.0; FEATURE_COUNT];
    for (column, median_slot) in feature_medians.iter_mut().enumerate() {
        let observed: Vec<f64> = encoded.iter().filter_map(|row| row.get(column)).collect();
        *median_slot = match median(&observed) {
            Some(value) => value,
            None => {
                warn!(
                    column = FEATURE_NAMES[column],
                    "Column has no observed values; imputing 0.0"
                );
                0.0
            }
        };
    }

    let observed_scores: Vec<f64> = records
        .iter()
        .filter_map(|record| record.score)
        .filter(|score| score.is_finite())
        .collect();
    let target_median = median(&observed_scores).ok_or_else(|| {
        PredictorError::InsufficientData("no record has an observed score".to_string())
    })?;

    let mut features = Array2::<f64>::zeros((records.len(), FEATURE_COUNT));
    for (row, vector) in encoded.iter().enumerate() {
        let dense = vector.impute(&feature_medians);
        for (column, value) in dense.iter().enumerate() {
            features[(row, column)] = *value;
        }
    }

    let targets: Array1<f64> = records
        .iter()
        .map(|record| {
            record
                .score
                .filter(|score| score.is_finite())
                .unwrap_or(target_median)
        })
        .collect();

    let imputed_cells: usize = encoded.iter().map(EncodedFeatureVector::missing_count).sum();
    debug!(
        rows = records.len(),
        imputed_cells,
        imputed_scores = records.len() - observed_scores.len(),
        "Prepared training dataset"
    );

    Ok(PreparedDataset {
        features,
        targets,
        medians: ColumnMedians {
            features: feature_medians,
            target: target_median,
        },
    })
}

/// Median of the given values; even counts average the two middle values.
pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{RollNumber, StudentFeatures};
    use pretty_assertions::assert_eq;

    fn record(id: i64, stress: Option<i64>, style: Option<&str>, score: Option<f64>) -> StudentRecord {
        StudentRecord {
            roll_number: RollNumber(id),
            name: format!("Student {}", id),
            features: StudentFeatures {
                attendance: Some(70 + id),
                hours_studied: Some(2.0 + id as f64),
                weekly_study_hours: Some(10.0 + id as f64),
                previous_score: Some(300.0 + 10.0 * id as f64),
                assignments_completed: Some(20),
                stress_level: stress,
                learning_style: style.map(str::to_string),
                extracurriculars_involved: Some(1),
                goal_score: Some(400.0),
            },
            score,
        }
    }

    #[test]
    fn test_single_record_is_insufficient() {
        let result = prepare(&[record(1, Some(4), Some("Visual"), Some(300.0))]);
        assert!(matches!(result, Err(PredictorError::InsufficientData(_))));
    }

    #[test]
    fn test_empty_store_is_insufficient() {
        assert!(matches!(prepare(&[]), Err(PredictorError::InsufficientData(_))));
    }

    #[test]
    fn test_rows_match_records_and_nothing_missing() {
        let records = vec![
            record(1, Some(2), Some("Visual"), Some(310.0)),
            record(2, None, Some("Tactile"), Some(320.0)),
            record(3, Some(6), None, None),
        ];
        let dataset = prepare(&records).unwrap();

        assert_eq!(dataset.features.nrows(), 3);
        assert_eq!(dataset.features.ncols(), FEATURE_COUNT);
        assert_eq!(dataset.len(), 3);
        assert!(dataset.features.iter().all(|v| v.is_finite()));
        assert!(dataset.targets.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_missing_stress_level_uses_median_of_others() {
        let records = vec![
            record(1, Some(2), Some("Visual"), Some(300.0)),
            record(2, Some(9), Some("Visual"), Some(310.0)),
            record(3, Some(4), Some("Visual"), Some(320.0)),
            record(4, None, Some("Visual"), Some(330.0)),
        ];
        let dataset = prepare(&records).unwrap();

        // median of [2, 4, 9]
        assert_eq!(dataset.features[(3, 5)], 4.0);
        assert_eq!(dataset.medians.features[5], 4.0);
    }

    #[test]
    fn test_unmapped_style_imputed_with_style_median() {
        let records = vec![
            record(1, Some(1), Some("Visual"), Some(300.0)),
            record(2, Some(1), Some("Kinesthetic"), Some(310.0)),
            record(3, Some(1), Some("Unknown"), Some(320.0)),
        ];
        let dataset = prepare(&records).unwrap();
        assert_eq!(dataset.features[(2, 6)], 2.0);
    }

    #[test]
    fn test_missing_score_imputed_with_score_median() {
        let records = vec![
            record(1, Some(1), Some("Visual"), Some(100.0)),
            record(2, Some(1), Some("Visual"), Some(300.0)),
            record(3, Some(1), Some("Visual"), None),
        ];
        let dataset = prepare(&records).unwrap();
        assert_eq!(dataset.targets[2], 200.0);
    }

    #[test]
    fn test_no_observed_scores_is_insufficient() {
        let records = vec![
            record(1, Some(1), Some("Visual"), None),
            record(2, Some(1), Some("Visual"), None),
        ];
        assert!(matches!(prepare(&records), Err(PredictorError::InsufficientData(_))));
    }

    #[test]
    fn test_median() {
        assert_eq!(median(&[]), None);
        assert_eq!(median(&[3.0]), Some(3.0));
        assert_eq!(median(&[5.0, 1.0, 3.0]), Some(3.0));
        assert_eq!(median(&[4.0, 1.0, 3.0, 2.0]), Some(2.5));
    }
}
