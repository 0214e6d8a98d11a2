//! Generic combinators building new generators from existing ones.

use std::fmt;
use std::rc::Rc;

use log::{debug, trace};

use crate::error::GenError;
use crate::generator::{BoxedGenerator, Generator};
use crate::ledger::ChoiceLedger;
use crate::shrink::ShrinkSequence;

/// Default number of candidates a filter may reject before giving up
pub const DEFAULT_FILTER_ATTEMPTS: usize = 1000;

/// Generator returned by [`Generator::map`]
#[derive(Clone)]
pub struct Map<G, F> {
    base: G,
    f: F,
}

impl<G, F> Map<G, F> {
    pub(crate) fn new(base: G, f: F) -> Self {
        Self { base, f }
    }
}

impl<G, F, U> Generator for Map<G, F>
where
    G: Generator,
    F: Fn(G::Value) -> U,
{
    type Value = U;

    fn produce(&self, ledger: &mut ChoiceLedger) -> Result<U, GenError> {
        let base = self.base.produce(ledger)?;
        Ok((self.f)(base))
    }
}

impl<G: fmt::Debug, F> fmt::Debug for Map<G, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Map").field("base", &self.base).finish()
    }
}

/// Generator returned by [`Generator::filter`]
pub struct Filter<G, P> {
    base: G,
    predicate: Rc<P>,
    max_attempts: usize,
}

impl<G: Clone, P> Clone for Filter<G, P> {
    fn clone(&self) -> Self {
        Self {
            base: self.base.clone(),
            predicate: Rc::clone(&self.predicate),
            max_attempts: self.max_attempts,
        }
    }
}

impl<G, P> Filter<G, P> {
    pub(crate) fn new(base: G, predicate: P) -> Self {
        Self {
            base,
            predicate: Rc::new(predicate),
            max_attempts: DEFAULT_FILTER_ATTEMPTS,
        }
    }

    /// Set how many rejections are tolerated before failing with a filter `Overrun`
    pub fn max_attempts(mut self, max_attempts: usize) -> Self {
        self.max_attempts = max_attempts;
        self
    }
}

impl<G, P> Generator for Filter<G, P>
where
    G: Generator,
    G::Value: 'static,
    P: Fn(&G::Value) -> bool + 'static,
{
    type Value = G::Value;

    fn produce(&self, ledger: &mut ChoiceLedger) -> Result<G::Value, GenError> {
        for attempt in 0..self.max_attempts {
            let candidate = self.base.produce(ledger)?;
            if (self.predicate)(&candidate) {
                return Ok(candidate);
            }
            trace!("filter rejected candidate {}", attempt + 1);
        }
        debug!("filter exhausted after {} attempts", self.max_attempts);
        Err(GenError::filter_overrun(self.max_attempts))
    }

    fn shrink(&self, value: &G::Value) -> ShrinkSequence<G::Value> {
        let predicate = Rc::clone(&self.predicate);
        self.base
            .shrink(value)
            .filter(move |candidate| predicate(candidate))
    }
}

impl<G: fmt::Debug, P> fmt::Debug for Filter<G, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Filter")
            .field("base", &self.base)
            .field("max_attempts", &self.max_attempts)
            .finish()
    }
}

/// Generator returned by [`Generator::flat_map`]
#[derive(Clone)]
pub struct FlatMap<G, F> {
    base: G,
    f: F,
}

impl<G, F> FlatMap<G, F> {
    pub(crate) fn new(base: G, f: F) -> Self {
        Self { base, f }
    }
}

impl<G, F, H> Generator for FlatMap<G, F>
where
    G: Generator,
    H: Generator,
    F: Fn(&G::Value) -> Result<H, GenError>,
{
    type Value = H::Value;

    fn produce(&self, ledger: &mut ChoiceLedger) -> Result<H::Value, GenError> {
        let base = self.base.produce(ledger)?;
        let next = (self.f)(&base)?;
        next.produce(ledger)
    }
}

/// Picks one of several generators by weight and delegates to it.
///
/// Values carry no record of the branch that produced them, so a frequency
/// generator does not shrink.
pub struct Frequency<T> {
    weights: Vec<u64>,
    branches: Vec<BoxedGenerator<T>>,
}

impl<T> Clone for Frequency<T> {
    fn clone(&self) -> Self {
        Self {
            weights: self.weights.clone(),
            branches: self.branches.clone(),
        }
    }
}

impl<T> Generator for Frequency<T> {
    type Value = T;

    fn produce(&self, ledger: &mut ChoiceLedger) -> Result<T, GenError> {
        let index = ledger.weighted_choice(&self.weights)?;
        self.branches[index].produce(ledger)
    }
}

impl<T> fmt::Debug for Frequency<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Frequency")
            .field("weights", &self.weights)
            .finish_non_exhaustive()
    }
}

/// Choose between generators with probability proportional to their weights.
///
/// An empty, all-zero or overflowing weight set fails with `InvalidChoice`
/// when a value is produced.
pub fn frequency<T>(entries: Vec<(u64, BoxedGenerator<T>)>) -> Frequency<T> {
    let (weights, branches) = entries.into_iter().unzip();
    Frequency { weights, branches }
}

/// Choose uniformly between generators
pub fn one_of<T>(branches: Vec<BoxedGenerator<T>>) -> Frequency<T> {
    frequency(branches.into_iter().map(|branch| (1, branch)).collect())
}

/// Produces a pair whose second half is drawn from a generator built from the first.
#[derive(Clone)]
pub struct Dependent<G, F> {
    first: G,
    make_second: F,
}

impl<G, F, H> Generator for Dependent<G, F>
where
    G: Generator,
    G::Value: Clone + 'static,
    H: Generator,
    H::Value: 'static,
    F: Fn(&G::Value) -> Result<H, GenError>,
{
    type Value = (G::Value, H::Value);

    fn produce(&self, ledger: &mut ChoiceLedger) -> Result<Self::Value, GenError> {
        let first = self.first.produce(ledger)?;
        let second = (self.make_second)(&first)?.produce(ledger)?;
        Ok((first, second))
    }

    /// Only the second half shrinks: a different first half could invalidate it.
    fn shrink(&self, value: &Self::Value) -> ShrinkSequence<Self::Value> {
        let (first, second) = value;
        let Ok(generator) = (self.make_second)(first) else {
            return ShrinkSequence::empty();
        };
        let first = first.clone();
        generator
            .shrink(second)
            .map(move |candidate| (first.clone(), candidate))
    }
}

/// Produce a value from `first`, then a second value from the generator `make_second` builds for it
pub fn dependent<G, F, H>(first: G, make_second: F) -> Dependent<G, F>
where
    G: Generator,
    H: Generator,
    F: Fn(&G::Value) -> Result<H, GenError>,
{
    Dependent { first, make_second }
}

macro_rules! tuple_generator {
    ($($g:ident : $idx:tt),+) => {
        impl<$($g),+> Generator for ($($g,)+)
        where
            $(
                $g: Generator + Clone + 'static,
                <$g as Generator>::Value: Clone + 'static,
            )+
        {
            type Value = ($(<$g as Generator>::Value,)+);

            fn produce(&self, ledger: &mut ChoiceLedger) -> Result<Self::Value, GenError> {
                Ok(($(self.$idx.produce(ledger)?,)+))
            }

            /// Shrinks one component at a time, left to right, holding the others fixed.
            ///
            /// A component's candidates are only built once every component
            /// before it has run out.
            fn shrink(&self, value: &Self::Value) -> ShrinkSequence<Self::Value> {
                let generators = self.clone();
                let failing = value.clone();
                ShrinkSequence::concat_with([$($idx),+].len(), move |component| match component {
                    $($idx => {
                        let candidates = generators.$idx.shrink(&failing.$idx);
                        let base = failing.clone();
                        candidates.map(move |candidate| {
                            let mut whole = base.clone();
                            whole.$idx = candidate;
                            whole
                        })
                    })+
                    _ => ShrinkSequence::empty(),
                })
            }
        }
    };
}

tuple_generator!(A: 0, B: 1);
tuple_generator!(A: 0, B: 1, C: 2);
tuple_generator!(A: 0, B: 1, C: 2, D: 3);

/// Pair two generators
pub fn tuples2<A, B>(a: A, b: B) -> (A, B) {
    (a, b)
}

/// Combine three generators into a triple
pub fn tuples3<A, B, C>(a: A, b: B, c: C) -> (A, B, C) {
    (a, b, c)
}

/// Combine four generators
pub fn tuples4<A, B, C, D>(a: A, b: B, c: C, d: D) -> (A, B, C, D) {
    (a, b, c, d)
}
