use crate::parameter::ParameterError;
use thiserror::Error;

/// Error type for invalid inputs, inconsistent configurations and convergence problems.
#[derive(Error, Debug)]
pub enum EosError {
    #[error("{0}")]
    Error(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Equation of state is initialized for {0} components while the input specifies {1} components.")]
    IncompatibleComponents(usize, usize),
    #[error("Configuration error: {0}")]
    Configuration(String),
    #[error("`{context}` did not converge within {iterations} iterations (residual {residual:e}).")]
    NotConverged {
        context: String,
        iterations: usize,
        residual: f64,
    },
    #[error("Parameter tables are at generation {current}, but derived parameters were last refreshed at generation {refreshed}.")]
    StaleParameters { current: u64, refreshed: u64 },
    #[error(transparent)]
    ParameterError(#[from] ParameterError),
}

impl EosError {
    /// Whether the error was caused by invalid user input rather than the model.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::InvalidInput(_) | Self::IncompatibleComponents(_, _)
        )
    }
}

/// Convenience type for `Result<T, EosError>`.
pub type EosResult<T> = Result<T, EosError>;
