use thiserror::Error;

use crate::discipline::Discipline;

/// Rejected settings; raised before a run can start.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("quantity must be between {min} and {max}, got {got}")]
    Quantity { min: usize, max: usize, got: usize },
    #[error("time limit must be between {min} and {max} seconds, got {got}")]
    TimeLimit { min: u32, max: u32, got: u32 },
    #[error("pace must be at most {max} items per minute, got {got}")]
    Pace { max: u32, got: u32 },
    #[error("grouping must be between {min} and {max}, got {got}")]
    Grouping { min: usize, max: usize, got: usize },
}

/// Failure of an external list generator. Never reaches the session controller:
/// the content generator converts every variant into fallback content.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerationError {
    #[error("list source unavailable: {0}")]
    Unavailable(String),
    #[error("list source returned nothing")]
    Empty,
    #[error("list source returned {got} of {wanted} items")]
    Short { wanted: usize, got: usize },
    #[error("malformed list: {0}")]
    Malformed(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AdviceError {
    #[error("nothing to advise on")]
    EmptySample,
    #[error("advisor unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("history database error: {0}")]
    Db(#[from] rusqlite::Error),
    #[error("history record is not valid json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("history export failed: {0}")]
    Csv(#[from] csv::Error),
    #[error("history io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Rejected recall input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecallError {
    #[error("not in the recall phase")]
    NotRecalling,
    #[error("a {answer} answer does not fit a {discipline} recall")]
    WrongAnswerKind {
        discipline: Discipline,
        answer: &'static str,
    },
    #[error("{0} recall is typed into a single buffer")]
    BufferOnly(Discipline),
    #[error("slot {slot} is outside 0..{len}")]
    SlotOutOfRange { slot: usize, len: usize },
}
