use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("Project error: {0}")]
    Project(#[from] nn_project::ProjectError),

    #[error("Evaluation error: {0}")]
    Symbolic(#[from] nn_symbolic::SymbolicError),

    #[error("Generation error: {0}")]
    Emit(#[from] nn_codegen::EmitError),

    #[error("{0}")]
    Usage(String),
}

pub type CliResult<T> = Result<T, CliError>;
