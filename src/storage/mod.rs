use rusqlite::{params, Connection, OptionalExtension, Row};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info};

use crate::config::StoreConfig;
use crate::core::{NewStudent, PredictorError, PredictorResult, RollNumber, StudentFeatures, StudentRecord};

/// Path value that selects a private in-memory SQLite database
pub const IN_MEMORY_PATH: &str = ":memory:";

const CREATE_TABLE: &str = "
    CREATE TABLE IF NOT EXISTS students (
        roll_number INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        attendance INTEGER,
        hours_studied REAL,
        weekly_study_hours REAL,
        previous_score REAL,
        assignments_completed INTEGER,
        stress_level INTEGER,
        learning_style TEXT,
        extracurriculars_involved INTEGER,
        goal_score REAL,
        score REAL
    )";

const SELECT_COLUMNS: &str = "
    SELECT roll_number, name, attendance, hours_studied, weekly_study_hours, previous_score,
           assignments_completed, stress_level, learning_style, extracurriculars_involved,
           goal_score, score
    FROM students";

/// Durable table of student records
pub trait RecordStore {
    /// Insert one record and return its generated roll number
    fn insert(&mut self, student: &NewStudent) -> PredictorResult<RollNumber>;

    /// All records in roll number order
    fn fetch_all(&self) -> PredictorResult<Vec<StudentRecord>>;

    /// `Ok(None)` when no record has the given roll number
    fn fetch_by_id(&self, roll_number: RollNumber) -> PredictorResult<Option<StudentRecord>>;
}

/// SQLite-backed record store
pub struct SqliteRecordStore {
    conn: Connection,
}

impl SqliteRecordStore {
    /// Open (or create) the database named by `config` and ensure the
    /// `students` table exists.
    pub fn open(config: &StoreConfig) -> PredictorResult<Self> {
        let conn = if config.path == Path::new(IN_MEMORY_PATH) {
            Connection::open_in_memory()
                .map_err(|e| PredictorError::store("opening in-memory database", e))?
        } else {
            if let Some(parent) = config.path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            Connection::open(&config.path).map_err(|e| {
                PredictorError::store(format!("opening {}", config.path.display()), e)
            })?
        };

        conn.execute(CREATE_TABLE, [])
            .map_err(|e| PredictorError::store("creating students table", e))?;

        info!(path = %config.path.display(), "Record store ready");
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> PredictorResult<Self> {
        Self::open(&StoreConfig {
            path: IN_MEMORY_PATH.into(),
        })
    }
}

fn record_from_row(row: &Row<'_>) -> rusqlite::Result<StudentRecord> {
    Ok(StudentRecord {
        roll_number: RollNumber(row.get(0)?),
        name: row.get(1)?,
        features: StudentFeatures {
            attendance: row.get(2)?,
            hours_studied: row.get(3)?,
            weekly_study_hours: row.get(4)?,
            previous_score: row.get(5)?,
            assignments_completed: row.get(6)?,
            stress_level: row.get(7)?,
            learning_style: row.get(8)?,
            extracurriculars_involved: row.get(9)?,
            goal_score: row.get(10)?,
        },
        score: row.get(11)?,
    })
}

impl RecordStore for SqliteRecordStore {
    fn insert(&mut self, student: &NewStudent) -> PredictorResult<RollNumber> {
        let f = &student.features;
        self.conn
            .execute(
                "INSERT INTO students (
                    name, attendance, hours_studied, weekly_study_hours, previous_score,
                    assignments_completed, stress_level, learning_style,
                    extracurriculars_involved, goal_score, score
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
                params![
                    student.name,
                    f.attendance,
                    f.hours_studied,
                    f.weekly_study_hours,
                    f.previous_score,
                    f.assignments_completed,
                    f.stress_level,
                    f.learning_style,
                    f.extracurriculars_involved,
                    f.goal_score,
                    student.score,
                ],
            )
            .map_err(|e| PredictorError::store("inserting student", e))?;

        let roll_number = RollNumber(self.conn.last_insert_rowid());
        debug!(%roll_number, "Inserted student");
        Ok(roll_number)
    }

    fn fetch_all(&self) -> PredictorResult<Vec<StudentRecord>> {
        let sql = format!("{} ORDER BY roll_number", SELECT_COLUMNS);
        let mut stmt = self
            .conn
            .prepare(&sql)
            .map_err(|e| PredictorError::store("preparing fetch", e))?;

        let records = stmt
            .query_map([], record_from_row)
            .and_then(|rows| rows.collect::<rusqlite::Result<Vec<_>>>())
            .map_err(|e| PredictorError::store("fetching students", e))?;

        debug!(count = records.len(), "Fetched students");
        Ok(records)
    }

    fn fetch_by_id(&self, roll_number: RollNumber) -> PredictorResult<Option<StudentRecord>> {
        let sql = format!("{} WHERE roll_number = ?1", SELECT_COLUMNS);
        self.conn
            .query_row(&sql, params![roll_number.0], record_from_row)
            .optional()
            .map_err(|e| PredictorError::store("searching by roll number", e))
    }
}

/// Volatile store with the same identity semantics as the SQLite table
#[derive(Debug, Default)]
pub struct MemoryRecordStore {
    records: BTreeMap<RollNumber, StudentRecord>,
    next_id: i64,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RecordStore for MemoryRecordStore {
    fn insert(&mut self, student: &NewStudent) -> PredictorResult<RollNumber> {
        self.next_id += 1;
        let roll_number = RollNumber(self.next_id);
        self.records
            .insert(roll_number, StudentRecord::from_new(roll_number, student.clone()));
        Ok(roll_number)
    }

    fn fetch_all(&self) -> PredictorResult<Vec<StudentRecord>> {
        Ok(self.records.values().cloned().collect())
    }

    fn fetch_by_id(&self, roll_number: RollNumber) -> PredictorResult<Option<StudentRecord>> {
        Ok(self.records.get(&roll_number).cloned())
    }
}
