use thiserror::Error;

/// Failure taxonomy surfaced to the route layer. Everything rolls back
/// the surrounding transaction; `Persistence` is the only transient kind.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("requested time slot is missing or no longer available")]
    SlotUnavailable,

    #[error("consultation {0} is in a state that does not allow this action")]
    InvalidTransition(i32),

    #[error("actor is not allowed to perform this action")]
    AuthorizationDenied,

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("lawyer {0} has no positive price configured")]
    PriceNotConfigured(i32),

    #[error("invalid review: {0}")]
    InvalidReview(&'static str),

    #[error("storage failure: {0}")]
    Persistence(#[from] sqlx::Error),

    #[error("payment gateway error: {0}")]
    Gateway(String),
}

pub type EngineResult<T> = Result<T, EngineError>;

impl EngineError {
    /// Transient failures are safe for the caller to retry verbatim.
    pub fn is_transient(&self) -> bool {
        matches!(self, EngineError::Persistence(_))
    }
}
