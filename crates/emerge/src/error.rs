//! The errors produced while scoring records and mining explanations.

/// Errors from detectors, miners and analyzers.
///
/// `DegenerateModel` is recoverable: analyzers report it as "no signal" and
/// carry on. The numerical variants abort only the model that raised them.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    /// The data cannot support a model, e.g. zero variance or too few records.
    #[error("degenerate model: {0}")]
    DegenerateModel(String),
    /// A matrix could not be inverted or its determinant underflowed.
    #[error("numerical instability: {0}")]
    NumericalInstability(String),
    /// A bounded unit of work did not finish within its budget.
    #[error("`{task}` did not finish within {budget_ms}ms")]
    Timeout {
        /// The name of the abandoned task.
        task: String,
        /// The wall-clock budget that was exceeded.
        budget_ms: u128,
    },
    /// A detector was asked to score before it was trained.
    #[error("the detector has not been trained")]
    NotTrained,
    /// A record did not have the number of metrics the model expects.
    #[error("expected {expected} metrics but found {found}")]
    DimensionMismatch {
        /// The dimension of the model.
        expected: usize,
        /// The dimension of the offending record.
        found: usize,
    },
    /// A bounded unit of work ended without producing a result.
    #[error("`{0}` ended without a result")]
    Aborted(String),
    /// A configuration value is out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// The record source failed to produce data.
    #[error("failed to load records: {0}")]
    Source(String),
}

impl Error {
    /// Whether this error means "no signal" rather than a failure.
    #[must_use]
    pub const fn is_degenerate(&self) -> bool {
        matches!(self, Self::DegenerateModel(_))
    }

    /// Whether this error only invalidates the model that raised it.
    ///
    /// Analyzers report such errors as "no signal" and keep going.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::DegenerateModel(_) | Self::NumericalInstability(_))
    }
}

/// A `Result` with the crate's `Error`.
pub type Result<T> = core::result::Result<T, Error>;
