//! Run options controlling how many cases are generated and how hard shrinking works.

use thiserror::Error;

use crate::ledger::DEFAULT_MAX_CHOICES;

/// Environment variable overriding the run seed
pub const SEED_VAR: &str = "CHANCERY_SEED";
/// Environment variable overriding the number of runs
pub const RUNS_VAR: &str = "CHANCERY_RUNS";
/// Environment variable overriding the shrink attempt budget
pub const MAX_SHRINKS_VAR: &str = "CHANCERY_MAX_SHRINKS";
/// Environment variable enabling verbose diagnostics
pub const VERBOSE_VAR: &str = "CHANCERY_VERBOSE";

const NUM_RUNS_DEFAULT: usize = 100;
const MAX_SHRINK_ATTEMPTS_DEFAULT: usize = 1000;

/// Configuration validation errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// The per-attempt choice budget must allow at least one draw
    #[error("invalid choice budget: {0} (must be > 0)")]
    InvalidChoiceBudget(usize),

    /// An environment override could not be parsed
    #[error("invalid value {value:?} for {var}")]
    InvalidEnv { var: &'static str, value: String },
}

/// Options for a single `check` run. Immutable once the run starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOptions {
    /// Number of generate-and-test iterations
    pub num_runs: usize,
    /// Fixed seed; when absent the run's seed source is asked
    pub seed: Option<u64>,
    /// Total candidates pulled from shrink sequences, across restarts
    pub max_shrink_attempts: usize,
    /// Emit per-step diagnostics; never changes behavior
    pub verbose: bool,
    /// Draw budget for a single generation attempt
    pub max_choices: usize,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            num_runs: NUM_RUNS_DEFAULT,
            seed: None,
            max_shrink_attempts: MAX_SHRINK_ATTEMPTS_DEFAULT,
            verbose: false,
            max_choices: DEFAULT_MAX_CHOICES,
        }
    }
}

impl RunOptions {
    /// Set the number of iterations
    pub fn num_runs(mut self, num_runs: usize) -> Self {
        self.num_runs = num_runs;
        self
    }

    /// Set a fixed seed for reproducible runs
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Set the shrink attempt budget. Zero disables shrinking.
    pub fn max_shrink_attempts(mut self, max_shrink_attempts: usize) -> Self {
        self.max_shrink_attempts = max_shrink_attempts;
        self
    }

    /// Enable or disable verbose diagnostics
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Set the per-attempt choice budget
    pub fn max_choices(mut self, max_choices: usize) -> Self {
        self.max_choices = max_choices;
        self
    }

    /// Validate the options
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_choices == 0 {
            return Err(ConfigError::InvalidChoiceBudget(self.max_choices));
        }
        Ok(())
    }

    /// Apply `CHANCERY_*` overrides from the process environment.
    pub fn with_env_overrides(self) -> Result<Self, ConfigError> {
        self.with_overrides(|var| std::env::var(var).ok())
    }

    /// Apply overrides from an arbitrary variable lookup.
    ///
    /// Empty values are treated as unset.
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&'static str) -> Option<String>,
    {
        if let Some(seed) = parse_var(&lookup, SEED_VAR, |s| s.parse::<u64>().ok())? {
            self.seed = Some(seed);
        }
        if let Some(runs) = parse_var(&lookup, RUNS_VAR, |s| s.parse::<usize>().ok())? {
            self.num_runs = runs;
        }
        if let Some(shrinks) = parse_var(&lookup, MAX_SHRINKS_VAR, |s| s.parse::<usize>().ok())? {
            self.max_shrink_attempts = shrinks;
        }
        if let Some(verbose) = parse_var(&lookup, VERBOSE_VAR, parse_bool)? {
            self.verbose = verbose;
        }
        self.validate()?;
        Ok(self)
    }
}

fn parse_var<F, T>(
    lookup: &F,
    var: &'static str,
    parse: impl Fn(&str) -> Option<T>,
) -> Result<Option<T>, ConfigError>
where
    F: Fn(&'static str) -> Option<String>,
{
    let Some(value) = lookup(var) else {
        return Ok(None);
    };
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    match parse(trimmed) {
        Some(parsed) => Ok(Some(parsed)),
        None => Err(ConfigError::InvalidEnv { var, value }),
    }
}

fn parse_bool(s: &str) -> Option<bool> {
    match s {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
