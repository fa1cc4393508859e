use tracing::{debug, warn};

use crate::core::{LearningStyle, StudentFeatures};

/// Number of predictive fields
pub const FEATURE_COUNT: usize = 9;

/// Column order shared by the training matrix and every inference vector.
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "attendance",
    "hours_studied",
    "weekly_study_hours",
    "previous_score",
    "assignments_completed",
    "stress_level",
    "learning_style_encoded",
    "extracurriculars_involved",
    "goal_score",
];

/// Index of the learning style code within the vector
pub const LEARNING_STYLE_SLOT: usize = 6;

/// Fixed-order numeric view of a student's features; `None` marks a value
/// that still has to be imputed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EncodedFeatureVector(pub [Option<f64>; FEATURE_COUNT]);

impl EncodedFeatureVector {
    pub fn values(&self) -> &[Option<f64>; FEATURE_COUNT] {
        &self.0
    }

    pub fn get(&self, slot: usize) -> Option<f64> {
        self.0.get(slot).copied().flatten()
    }

    pub fn missing_count(&self) -> usize {
        self.0.iter().filter(|value| value.is_none()).count()
    }

    /// Fill every missing slot from `fill`
    pub fn impute(&self, fill: &[f64; FEATURE_COUNT]) -> [f64; FEATURE_COUNT] {
        let mut dense = [0.0; FEATURE_COUNT];
        for (slot, value) in dense.iter_mut().enumerate() {
            *value = self.0[slot].unwrap_or(fill[slot]);
        }
        dense
    }
}

/// Encode a record's features. Unknown learning styles and non-finite
/// numbers become missing values instead of errors.
pub fn encode(features: &StudentFeatures) -> EncodedFeatureVector {
    EncodedFeatureVector([
        finite(features.attendance.map(|v| v as f64)),
        finite(features.hours_studied),
        finite(features.weekly_study_hours),
        finite(features.previous_score),
        finite(features.assignments_completed.map(|v| v as f64)),
        finite(features.stress_level.map(|v| v as f64)),
        encode_learning_style(features.learning_style.as_deref()),
        finite(features.extracurriculars_involved.map(|v| v as f64)),
        finite(features.goal_score),
    ])
}

fn encode_learning_style(raw: Option<&str>) -> Option<f64> {
    match raw {
        None => {
            debug!("Learning style missing; leaving slot for imputation");
            None
        }
        Some(raw) => match LearningStyle::parse(raw) {
            Some(style) => Some(f64::from(style.code())),
            None => {
                warn!(value = %raw, "Unrecognized learning style; leaving slot for imputation");
                None
            }
        },
    }
}

fn finite(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    fn sample_features(style: Option<&str>) -> StudentFeatures {
        StudentFeatures {
            attendance: Some(92),
            hours_studied: Some(4.5),
            weekly_study_hours: Some(20.0),
            previous_score: Some(410.0),
            assignments_completed: Some(27),
            stress_level: Some(3),
            learning_style: style.map(str::to_string),
            extracurriculars_involved: Some(2),
            goal_score: Some(450.0),
        }
    }

    #[test_case("Visual", 1.0)]
    #[test_case("Auditory", 2.0)]
    #[test_case("Kinesthetic", 3.0)]
    fn test_known_styles_encode_to_codes(style: &str, code: f64) {
        let encoded = encode(&sample_features(Some(style)));
        assert_eq!(encoded.get(LEARNING_STYLE_SLOT), Some(code));
        assert_eq!(encoded.missing_count(), 0);
    }

    #[test]
    fn test_field_order_is_fixed() {
        let encoded = encode(&sample_features(Some("Auditory")));
        assert_eq!(
            encoded.values(),
            &[
                Some(92.0),
                Some(4.5),
                Some(20.0),
                Some(410.0),
                Some(27.0),
                Some(3.0),
                Some(2.0),
                Some(2.0),
                Some(450.0),
            ]
        );
    }

    #[test]
    fn test_unknown_style_is_missing_not_error() {
        let encoded = encode(&sample_features(Some("Reading/Writing")));
        assert_eq!(encoded.get(LEARNING_STYLE_SLOT), None);
        assert_eq!(encoded.missing_count(), 1);
    }

    #[test]
    fn test_non_finite_values_are_missing() {
        let mut features = sample_features(Some("Visual"));
        features.hours_studied = Some(f64::NAN);
        features.goal_score = Some(f64::INFINITY);

        let encoded = encode(&features);
        assert_eq!(encoded.get(1), None);
        assert_eq!(encoded.get(8), None);
    }

    #[test]
    fn test_impute_fills_only_missing_slots() {
        let encoded = encode(&StudentFeatures {
            attendance: Some(80),
            ..Default::default()
        });
        let dense = encoded.impute(&[7.0; FEATURE_COUNT]);
        assert_eq!(dense[0], 80.0);
        assert!(dense[1..].iter().all(|v| *v == 7.0));
    }
}
