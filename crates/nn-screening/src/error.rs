use thiserror::Error;

pub type ScreeningResult<T> = Result<T, ScreeningError>;

/// Inconsistent screening group sequences.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScreeningError {
    #[error("Triple-alpha screening group at position {index} is not followed by its second leg")]
    OrphanTripleAlpha { index: usize },

    #[error("Screening group {name} at position {index} does not follow the triple-alpha group")]
    UnexpectedDummy { index: usize, name: String },
}
