use thiserror::Error;

#[derive(Error, Debug)]
pub enum CajeroError {
    #[error("Database error: {0}")]
    Db(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Unknown account: {0}")]
    UnknownAccount(String),

    #[error("Unknown movement: {0}")]
    UnknownRecord(String),

    #[error("Bridge error: {0}")]
    Bridge(String),

    #[error("Settings error: {0}")]
    Settings(String),

    #[error("Preview error: {0}")]
    Preview(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, CajeroError>;
