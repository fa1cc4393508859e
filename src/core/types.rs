use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity assigned by the record store on insert
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RollNumber(pub i64);

impl fmt::Display for RollNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LearningStyle {
    Visual,
    Auditory,
    Kinesthetic,
}

impl LearningStyle {
    pub const ALL: [LearningStyle; 3] = [
        LearningStyle::Visual,
        LearningStyle::Auditory,
        LearningStyle::Kinesthetic,
    ];

    /// Numeric code used in the feature vector
    pub fn code(self) -> u8 {
        match self {
            LearningStyle::Visual => 1,
            LearningStyle::Auditory => 2,
            LearningStyle::Kinesthetic => 3,
        }
    }

    /// Lenient lookup: surrounding whitespace and ASCII case are ignored.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        Self::ALL
            .into_iter()
            .find(|style| style.as_str().eq_ignore_ascii_case(raw))
    }

    pub fn as_str(self) -> &'static str {
        match self {
            LearningStyle::Visual => "Visual",
            LearningStyle::Auditory => "Auditory",
            LearningStyle::Kinesthetic => "Kinesthetic",
        }
    }
}

impl fmt::Display for LearningStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The nine predictive fields of a student observation.
///
/// Every field is optional because historical rows may hold NULLs. The
/// learning style is kept as raw text so unrecognized values survive storage
/// and are resolved at encoding time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StudentFeatures {
    pub attendance: Option<i64>,
    pub hours_studied: Option<f64>,
    pub weekly_study_hours: Option<f64>,
    pub previous_score: Option<f64>,
    pub assignments_completed: Option<i64>,
    pub stress_level: Option<i64>,
    pub learning_style: Option<String>,
    pub extracurriculars_involved: Option<i64>,
    pub goal_score: Option<f64>,
}

/// A student observation that has not been stored yet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewStudent {
    pub name: String,
    pub features: StudentFeatures,
    pub score: Option<f64>,
}

/// A stored student observation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentRecord {
    pub roll_number: RollNumber,
    pub name: String,
    pub features: StudentFeatures,
    pub score: Option<f64>,
}

impl StudentRecord {
    pub fn from_new(roll_number: RollNumber, student: NewStudent) -> Self {
        Self {
            roll_number,
            name: student.name,
            features: student.features,
            score: student.score,
        }
    }
}
