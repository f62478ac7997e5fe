use thiserror::Error;

#[derive(Error, Debug)]
pub enum SimError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Missing required key '{key}' in {section}")]
    MissingKey { section: &'static str, key: String },

    #[error("Key '{key}' in {section} is not a number")]
    NonNumericKey { section: &'static str, key: String },

    #[error("Key '{key}' in {section} must be a whole year within range")]
    NonIntegerKey { section: &'static str, key: String },

    #[error("Years must be an integer in [1, 100], got {years}")]
    InvalidYears { years: i64 },

    #[error("Reference table has no rows")]
    EmptyReference,

    #[error("Reference column '{column}' missing at row {row}")]
    MissingReferenceColumn { column: String, row: usize },

    #[error("Run already completed")]
    RunCompleted,

    #[error("Subsystem '{subsystem}' ran before '{needs}' produced its output")]
    SubsystemOrder { subsystem: &'static str, needs: &'static str },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type SimResult<T> = Result<T, SimError>;
