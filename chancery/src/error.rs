//! Error types for generation failures and failed property checks.

use std::fmt;

use thiserror::Error;

use crate::config::ConfigError;

/// Failure raised while producing a value from a generator.
///
/// Generation errors are fatal to the current run: the orchestrator never
/// retries them and never confuses them with a property failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenError {
    /// A generation attempt ran out of budget.
    ///
    /// Both the ledger's draw budget and a filter's rejection budget end up
    /// here; `cause` tells them apart.
    #[error("{cause} budget of {budget} exhausted")]
    Overrun { budget: usize, cause: OverrunCause },

    /// Malformed generator configuration: empty choice set, bad weights or an inverted range.
    #[error("invalid choice: {0}")]
    InvalidChoice(String),

    /// An allocation for a generated value could not be satisfied.
    #[error("out of memory while generating a value")]
    OutOfMemory,
}

impl GenError {
    /// Create an invalid choice error
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidChoice(message.into())
    }

    /// The ledger allowed no more than `budget` draws
    pub fn choice_overrun(budget: usize) -> Self {
        Self::Overrun {
            budget,
            cause: OverrunCause::Choices,
        }
    }

    /// A filter rejected `attempts` candidates in a row
    pub fn filter_overrun(attempts: usize) -> Self {
        Self::Overrun {
            budget: attempts,
            cause: OverrunCause::Filter,
        }
    }

    /// Whether this error is an overrun of any budget
    pub fn is_overrun(&self) -> bool {
        matches!(self, Self::Overrun { .. })
    }
}

/// Which budget an [`GenError::Overrun`] exhausted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverrunCause {
    /// Draws from the choice ledger
    Choices,
    /// Rejections inside a `filter`
    Filter,
}

impl fmt::Display for OverrunCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Choices => write!(f, "choice"),
            Self::Filter => write!(f, "filter rejection"),
        }
    }
}

impl From<std::collections::TryReserveError> for GenError {
    fn from(_: std::collections::TryReserveError) -> Self {
        Self::OutOfMemory
    }
}

/// A failing input found by a run, together with its minimal form.
#[derive(Debug)]
pub struct Counterexample<T, E> {
    /// Seed the run was started with
    pub seed: u64,
    /// Zero-based iteration on which the property first failed
    pub iteration: usize,
    /// The error the property returned for the original input
    pub error: E,
    /// The input that first failed
    pub original: T,
    /// Smaller input that still fails, if shrinking found one
    pub shrunk: Option<T>,
    /// Number of accepted shrink steps
    pub shrink_steps: usize,
    /// Number of candidates pulled from shrink sequences
    pub shrink_attempts: usize,
    /// Choices recorded while producing the original input
    pub choices: Vec<u64>,
}

impl<T, E> Counterexample<T, E> {
    /// The smallest known failing input.
    pub fn minimal(&self) -> &T {
        self.shrunk.as_ref().unwrap_or(&self.original)
    }

    /// Consume the counterexample, keeping only the property's error.
    pub fn into_error(self) -> E {
        self.error
    }

    /// Get a concise summary of the failure
    pub fn summary(&self) -> String
    where
        T: fmt::Debug,
        E: fmt::Display,
    {
        match self.shrunk {
            Some(ref shrunk) => format!(
                "property failed on iteration {} with input {:?} (shrunk from {:?}): {}",
                self.iteration, shrunk, self.original, self.error
            ),
            None => format!(
                "property failed on iteration {} with input {:?}: {}",
                self.iteration, self.original, self.error
            ),
        }
    }
}

/// Why a `check` run did not succeed.
#[derive(Debug)]
pub enum CheckError<T, E> {
    /// The run options were rejected before any value was generated.
    Config(ConfigError),

    /// Producing an input failed; the property was not consulted for it.
    Generation {
        error: GenError,
        seed: u64,
        iteration: usize,
    },

    /// The property failed. Carries the original error and the minimal input.
    Property(Box<Counterexample<T, E>>),
}

impl<T, E> CheckError<T, E> {
    /// The counterexample, if the property itself failed.
    pub fn counterexample(&self) -> Option<&Counterexample<T, E>> {
        match self {
            Self::Property(counterexample) => Some(counterexample.as_ref()),
            _ => None,
        }
    }

    /// The property's own error, discarding the inputs.
    pub fn into_property_error(self) -> Option<E> {
        match self {
            Self::Property(counterexample) => Some(counterexample.into_error()),
            _ => None,
        }
    }

    /// The generation error, if generation failed.
    pub fn generation_error(&self) -> Option<&GenError> {
        match self {
            Self::Generation { error, .. } => Some(error),
            _ => None,
        }
    }

    /// Seed of the failed run, when one had been resolved.
    pub fn seed(&self) -> Option<u64> {
        match self {
            Self::Config(_) => None,
            Self::Generation { seed, .. } => Some(*seed),
            Self::Property(counterexample) => Some(counterexample.seed),
        }
    }
}

impl<T: fmt::Debug, E: fmt::Display> fmt::Display for CheckError<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(error) => write!(f, "invalid run options: {}", error),
            Self::Generation {
                error,
                seed,
                iteration,
            } => write!(
                f,
                "generation failed on iteration {} (seed {}): {}",
                iteration, seed, error
            ),
            Self::Property(counterexample) => {
                write!(f, "{} (seed {})", counterexample.summary(), counterexample.seed)
            }
        }
    }
}

impl<T, E> std::error::Error for CheckError<T, E>
where
    T: fmt::Debug,
    E: std::error::Error + 'static,
{
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Config(error) => Some(error),
            Self::Generation { error, .. } => Some(error),
            Self::Property(counterexample) => Some(&counterexample.error),
        }
    }
}

/// Information about a run where every iteration passed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckSuccess {
    /// Number of iterations completed
    pub runs: usize,
    /// Seed the run was started with
    pub seed: u64,
}

/// Result of a `check` run.
pub type CheckResult<T, E> = Result<CheckSuccess, CheckError<T, E>>;
