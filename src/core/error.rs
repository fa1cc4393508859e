use thiserror::Error;

#[derive(Error, Debug)]
pub enum PredictorError {
    #[error("Record store unavailable ({context}): {source}")]
    StoreUnavailable {
        context: String,
        #[source]
        source: rusqlite::Error,
    },

    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl PredictorError {
    pub(crate) fn store(context: impl Into<String>, source: rusqlite::Error) -> Self {
        Self::StoreUnavailable {
            context: context.into(),
            source,
        }
    }
}

pub type PredictorResult<T> = Result<T, PredictorError>;
