//! # Chancery - Property-Based Testing for Rust
//!
//! Chancery generates many random inputs for a property, checks each one, and
//! when the property fails searches for a minimal failing input.
//!
//! Every generator draws its randomness from a [`ChoiceLedger`], a seeded
//! source that records each bounded draw and caps how many draws one value may
//! take. Shrinking is structural: each generator proposes smaller variants of
//! a failing value as a lazy [`ShrinkSequence`].
//!
//! ## Quick Start
//!
//! ```rust
//! use chancery::{RunOptions, check, ints, vecs};
//!
//! let generator = vecs(ints(0i32, 100).unwrap(), 0, 20).unwrap();
//! let result = check(
//!     generator,
//!     |v: &Vec<i32>| if v.len() < 5 { Ok(()) } else { Err("too long") },
//!     RunOptions::default().seed(7),
//! );
//!
//! let error = result.unwrap_err();
//! assert_eq!(error.counterexample().unwrap().minimal().len(), 5);
//! ```

pub mod arbitrary;
pub mod combinators;
pub mod config;
pub mod error;
pub mod execution;
pub mod generator;
pub mod ledger;
pub mod primitives;
pub mod property;
pub mod report;
pub mod rng;
pub mod shrink;

pub use arbitrary::Arbitrary;
pub use combinators::{
    DEFAULT_FILTER_ATTEMPTS, Dependent, Filter, FlatMap, Frequency, Map, dependent, frequency,
    one_of, tuples2, tuples3, tuples4,
};
pub use config::{ConfigError, RunOptions};
pub use error::{CheckError, CheckResult, CheckSuccess, Counterexample, GenError, OverrunCause};
pub use execution::{PropertyTest, check, check_with};
pub use generator::{BoxedGenerator, Generator, Just, just};
pub use ledger::{ChoiceInt, ChoiceLedger, DEFAULT_MAX_CHOICES};
pub use primitives::*;
pub use property::{Falsified, Holds, Property, holds};
pub use report::{DiagnosticSink, MemorySink, NullSink, StderrSink};
pub use rng::{ClockSeed, FixedSeed, SeedSource};
pub use shrink::{FloatShrink, FloatValue, IntShrink, ListShrink, OptionShrink, ShrinkSequence};

#[cfg(feature = "derive")]
pub use chancery_derive::Record;
