pub mod aggregator;
pub mod gemini;
pub mod orchestrator;
pub mod preference;
pub mod prompt;
pub mod ranker;
pub mod validator;

pub use aggregator::*;
pub use gemini::*;
pub use orchestrator::*;
pub use preference::*;
pub use prompt::*;
pub use ranker::*;
pub use validator::*;

use thiserror::Error;

use crate::db::DatabaseError;

#[derive(Error, Debug)]
pub enum EngineError {
    /// The pattern/history store could not be read or written. Retryable.
    #[error("pattern store unavailable: {0}")]
    PersistenceUnavailable(#[from] DatabaseError),

    /// Transport-level failure talking to the generation endpoint
    /// (network error, timeout, non-success status). Retryable.
    #[error("generation endpoint unavailable: {0}")]
    GenerationUnavailable(String),

    /// The endpoint answered but the response envelope is missing the
    /// expected candidate text. Signals an API contract change, not a
    /// bad generation.
    #[error("generation response envelope malformed: {0}")]
    GenerationMalformed(String),

    /// The model's text could not be coerced into the required shape.
    /// Not retryable without changing the prompt; the raw text rides
    /// along for diagnostics.
    #[error("generation output is not a valid {expected}: {reason}")]
    InvalidGenerationOutput {
        expected: &'static str,
        reason: String,
        raw: String,
    },
}
