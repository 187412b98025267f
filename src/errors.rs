use std::fmt;

/// Custom error types for the continuation search engine
#[derive(Debug, Clone)]
pub enum DaggerError {
    /// Archive location is missing, unreadable, or contains no partitions
    StorageUnavailable(String),
    /// Partition schema is missing a required column or carries an incompatible type
    SchemaMismatch { partition: String, detail: String },
    /// User game is too short to pick a learning moment
    InsufficientHistory { usable_plies: usize },
    /// No archived rows share the session's current fingerprint
    NoCandidates { fingerprint: u64, round: usize },
    /// Selected continuation was the final ply of its game
    ContinuationExhausted {
        game_id: u32,
        ply: u32,
        round: usize,
    },
    /// Search session was cancelled between rounds
    Cancelled { round: usize },
    /// PGN movetext produced no legal mainline
    InvalidGame(String),
    /// File I/O operation failed
    IoError(String),
    /// Evaluation oracle failed
    EvaluationError(String),
}

impl fmt::Display for DaggerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DaggerError::StorageUnavailable(msg) => write!(f, "Storage unavailable: {}", msg),
            DaggerError::SchemaMismatch { partition, detail } => {
                write!(f, "Schema mismatch in partition '{}': {}", partition, detail)
            }
            DaggerError::InsufficientHistory { usable_plies } => {
                write!(
                    f,
                    "Insufficient history: {} usable plies, need at least 2",
                    usable_plies
                )
            }
            DaggerError::NoCandidates { fingerprint, round } => {
                write!(
                    f,
                    "No archived candidates share fingerprint {} (round {})",
                    fingerprint, round
                )
            }
            DaggerError::ContinuationExhausted {
                game_id,
                ply,
                round,
            } => {
                write!(
                    f,
                    "Continuation exhausted: game {} ends at ply {} (round {})",
                    game_id, ply, round
                )
            }
            DaggerError::Cancelled { round } => {
                write!(f, "Search cancelled before round {}", round)
            }
            DaggerError::InvalidGame(msg) => write!(f, "Invalid game: {}", msg),
            DaggerError::IoError(msg) => write!(f, "I/O error: {}", msg),
            DaggerError::EvaluationError(msg) => write!(f, "Evaluation error: {}", msg),
        }
    }
}

impl std::error::Error for DaggerError {}

// Convenience type alias
pub type Result<T> = std::result::Result<T, DaggerError>;

// Convert from common error types
impl From<std::io::Error> for DaggerError {
    fn from(error: std::io::Error) -> Self {
        DaggerError::IoError(error.to_string())
    }
}

impl From<csv::Error> for DaggerError {
    fn from(error: csv::Error) -> Self {
        if error.is_io_error() {
            DaggerError::IoError(error.to_string())
        } else {
            DaggerError::SchemaMismatch {
                partition: "<unknown>".to_string(),
                detail: error.to_string(),
            }
        }
    }
}
