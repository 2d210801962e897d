use thiserror::Error;

#[derive(Debug, Error)]
pub enum VoltaicError {
    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Solver breakdown: {0}")]
    Breakdown(String),

    #[error("Did not converge after {iterations} iterations (residual {residual:.3e})")]
    NoConvergence { iterations: usize, residual: f64 },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, VoltaicError>;
