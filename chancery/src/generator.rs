//! Core generator abstraction.

use std::fmt;
use std::rc::Rc;

use crate::combinators::{Filter, FlatMap, Map};
use crate::error::GenError;
use crate::ledger::ChoiceLedger;
use crate::shrink::ShrinkSequence;

/// A reusable description of how to produce values from a choice ledger.
///
/// Generators never own the values they produce: every produced value is
/// handed to the caller, and releasing it is ordinary `Drop`. The same
/// generator can be shared across any number of runs.
pub trait Generator {
    /// Type of the produced values
    type Value;

    /// Produce one value, drawing every random decision from `ledger`
    fn produce(&self, ledger: &mut ChoiceLedger) -> Result<Self::Value, GenError>;

    /// Lazily propose smaller variants of a failing value.
    ///
    /// The default is an empty sequence, for values with no notion of "smaller".
    fn shrink(&self, value: &Self::Value) -> ShrinkSequence<Self::Value> {
        let _ = value;
        ShrinkSequence::empty()
    }

    /// Transform produced values. The mapped generator does not shrink.
    fn map<U, F>(self, f: F) -> Map<Self, F>
    where
        Self: Sized,
        F: Fn(Self::Value) -> U,
    {
        Map::new(self, f)
    }

    /// Keep only values satisfying `predicate`, retrying a bounded number of times
    fn filter<P>(self, predicate: P) -> Filter<Self, P>
    where
        Self: Sized,
        P: Fn(&Self::Value) -> bool,
    {
        Filter::new(self, predicate)
    }

    /// Build a second generator from each produced value and produce from it
    fn flat_map<H, F>(self, f: F) -> FlatMap<Self, F>
    where
        Self: Sized,
        H: Generator,
        F: Fn(&Self::Value) -> Result<H, GenError>,
    {
        FlatMap::new(self, f)
    }

    /// Erase the generator's type
    fn boxed(self) -> BoxedGenerator<Self::Value>
    where
        Self: Sized + 'static,
    {
        BoxedGenerator::new(self)
    }
}

impl<G: Generator + ?Sized> Generator for &G {
    type Value = G::Value;

    fn produce(&self, ledger: &mut ChoiceLedger) -> Result<G::Value, GenError> {
        (**self).produce(ledger)
    }

    fn shrink(&self, value: &G::Value) -> ShrinkSequence<G::Value> {
        (**self).shrink(value)
    }
}

impl<G: Generator + ?Sized> Generator for Box<G> {
    type Value = G::Value;

    fn produce(&self, ledger: &mut ChoiceLedger) -> Result<G::Value, GenError> {
        (**self).produce(ledger)
    }

    fn shrink(&self, value: &G::Value) -> ShrinkSequence<G::Value> {
        (**self).shrink(value)
    }
}

/// A type-erased generator, for mixing differently-typed generators of one value type.
///
/// Clones share the underlying generator.
pub struct BoxedGenerator<T> {
    generator: Rc<dyn Generator<Value = T>>,
}

impl<T> BoxedGenerator<T> {
    /// Box a generator
    pub fn new<G>(generator: G) -> Self
    where
        G: Generator<Value = T> + 'static,
    {
        Self {
            generator: Rc::new(generator),
        }
    }
}

impl<T> Clone for BoxedGenerator<T> {
    fn clone(&self) -> Self {
        Self {
            generator: Rc::clone(&self.generator),
        }
    }
}

impl<T> Generator for BoxedGenerator<T> {
    type Value = T;

    fn produce(&self, ledger: &mut ChoiceLedger) -> Result<T, GenError> {
        self.generator.produce(ledger)
    }

    fn shrink(&self, value: &T) -> ShrinkSequence<T> {
        self.generator.shrink(value)
    }
}

impl<T> fmt::Debug for BoxedGenerator<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoxedGenerator").finish_non_exhaustive()
    }
}

/// A generator that always produces the same value
#[derive(Debug, Clone)]
pub struct Just<T> {
    value: T,
}

impl<T: Clone> Generator for Just<T> {
    type Value = T;

    fn produce(&self, _ledger: &mut ChoiceLedger) -> Result<T, GenError> {
        Ok(self.value.clone())
    }
}

/// Always produce a clone of `value`, without consuming any choices
pub fn just<T: Clone>(value: T) -> Just<T> {
    Just { value }
}
