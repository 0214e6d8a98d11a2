//! Run orchestration: generate, test, shrink, report.

use std::fmt;

use log::{debug, info, trace, warn};

use crate::config::RunOptions;
use crate::error::{CheckError, CheckResult, CheckSuccess, Counterexample};
use crate::generator::Generator;
use crate::ledger::ChoiceLedger;
use crate::property::Property;
use crate::report::{DiagnosticSink, FailureReport, StderrSink, write_generation_failure};
use crate::rng::{ClockSeed, IterationSeeds, SeedSource};

/// A configured property check over one generator.
pub struct PropertyTest<G, P> {
    generator: G,
    property: P,
    options: RunOptions,
    seed_source: Box<dyn SeedSource>,
    sink: Box<dyn DiagnosticSink>,
}

/// Outcome of a shrink phase
struct ShrinkOutcome<T> {
    minimal: Option<T>,
    steps: usize,
    attempts: usize,
}

impl<G, P> PropertyTest<G, P>
where
    G: Generator,
    G::Value: fmt::Debug,
    P: Property<G::Value>,
    P::Error: fmt::Display,
{
    /// Check `property` against values from `generator` with default options
    pub fn new(generator: G, property: P) -> Self {
        Self {
            generator,
            property,
            options: RunOptions::default(),
            seed_source: Box::new(ClockSeed),
            sink: Box::new(StderrSink),
        }
    }

    /// Replace the run options
    pub fn options(mut self, options: RunOptions) -> Self {
        self.options = options;
        self
    }

    /// Where the seed comes from when the options don't fix one
    pub fn seed_source<S: SeedSource + 'static>(mut self, source: S) -> Self {
        self.seed_source = Box::new(source);
        self
    }

    /// Where diagnostics are written
    pub fn sink<S: DiagnosticSink + 'static>(mut self, sink: S) -> Self {
        self.sink = Box::new(sink);
        self
    }

    /// Run the check.
    ///
    /// Returns the property's original error with the minimal failing input
    /// on failure, or the generation error if producing an input failed.
    pub fn run(mut self) -> CheckResult<G::Value, P::Error> {
        self.options.validate().map_err(CheckError::Config)?;

        let seed = self
            .options
            .seed
            .unwrap_or_else(|| self.seed_source.seed());
        info!("checking {} runs with seed {}", self.options.num_runs, seed);
        if self.options.verbose {
            self.sink.emit(&format!(
                "checking {} runs with seed {}",
                self.options.num_runs, seed
            ));
        }

        let mut seeds = IterationSeeds::new(seed);
        for iteration in 0..self.options.num_runs {
            let mut ledger = ChoiceLedger::with_budget(seeds.next_seed(), self.options.max_choices);
            let value = match self.generator.produce(&mut ledger) {
                Ok(value) => value,
                Err(error) => {
                    warn!("generation failed on run {}: {}", iteration, error);
                    write_generation_failure(self.sink.as_mut(), iteration, seed, &error);
                    return Err(CheckError::Generation {
                        error,
                        seed,
                        iteration,
                    });
                }
            };
            trace!("run {}: {:?}", iteration, value);

            let error = match self.property.test(&value) {
                Ok(()) => continue,
                Err(error) => error,
            };

            info!("property failed on run {}, shrinking", iteration);
            let outcome = self.shrink_failure(&value);
            FailureReport {
                iteration,
                seed,
                error: &error,
                original: &value,
                minimal: outcome.minimal.as_ref().unwrap_or(&value),
                shrink_steps: outcome.steps,
                shrink_attempts: outcome.attempts,
            }
            .write_to(self.sink.as_mut());

            return Err(CheckError::Property(Box::new(Counterexample {
                seed,
                iteration,
                error,
                original: value,
                shrunk: outcome.minimal,
                shrink_steps: outcome.steps,
                shrink_attempts: outcome.attempts,
                choices: ledger.into_choices(),
            })));
        }

        info!("passed {} runs with seed {}", self.options.num_runs, seed);
        if self.options.verbose {
            self.sink
                .emit(&format!("passed {} runs (seed {})", self.options.num_runs, seed));
        }
        Ok(CheckSuccess {
            runs: self.options.num_runs,
            seed,
        })
    }

    /// Search for a smaller failing input, starting from `original`.
    ///
    /// Pulls at most `max_shrink_attempts` candidates in total. A passing
    /// candidate is dropped and the same sequence is pulled again; a failing
    /// one becomes the new minimal and the sequence is rebuilt from it.
    fn shrink_failure(&mut self, original: &G::Value) -> ShrinkOutcome<G::Value> {
        let budget = self.options.max_shrink_attempts;
        let mut minimal: Option<G::Value> = None;
        let mut steps = 0;
        let mut attempts = 0;

        let mut sequence = self.generator.shrink(original);
        while attempts < budget {
            let Some(candidate) = sequence.next() else {
                break;
            };
            attempts += 1;

            if self.property.test(&candidate).is_ok() {
                trace!("shrink candidate passed: {:?}", candidate);
                continue;
            }

            steps += 1;
            debug!("shrink step {} ({} attempts): {:?}", steps, attempts, candidate);
            if self.options.verbose {
                self.sink
                    .emit(&format!("shrink step {}: {:?}", steps, candidate));
            }
            std::mem::take(&mut sequence).close();
            sequence = self.generator.shrink(&candidate);
            minimal = Some(candidate);
        }

        if attempts >= budget && !sequence.is_exhausted() {
            warn!("shrinking stopped after {} attempts", budget);
        }
        sequence.close();

        ShrinkOutcome {
            minimal,
            steps,
            attempts,
        }
    }
}

/// Check a closure property with the given options, reporting to stderr.
///
/// Returns the property's own error (with the minimal input) on failure.
pub fn check<G, F, E>(generator: G, property: F, options: RunOptions) -> CheckResult<G::Value, E>
where
    G: Generator,
    G::Value: fmt::Debug,
    F: Fn(&G::Value) -> Result<(), E>,
    E: fmt::Display,
{
    PropertyTest::new(generator, property).options(options).run()
}

/// Check any [`Property`] implementation with the given options
pub fn check_with<G, P>(
    generator: G,
    property: P,
    options: RunOptions,
) -> CheckResult<G::Value, P::Error>
where
    G: Generator,
    G::Value: fmt::Debug,
    P: Property<G::Value>,
    P::Error: fmt::Display,
{
    PropertyTest::new(generator, property).options(options).run()
}
