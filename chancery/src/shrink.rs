//! Lazy shrink sequences for minimizing failing inputs.
//!
//! Every shrinker here follows one pull contract: the caller only pulls the
//! next candidate when the previous one passed the property. A candidate that
//! still fails is adopted as the new minimal and a fresh sequence is rooted at
//! it. Each sequence can therefore keep a simple monotone state between a
//! known-good bound and the known-bad value it was created from.

use std::fmt;

use crate::ledger::ChoiceInt;

/// Absolute distance below which float bisection stops
pub const FLOAT_EPSILON: f64 = 1e-6;

/// A finite, non-restartable, lazily evaluated sequence of shrink candidates.
///
/// Dropping the sequence (or calling [`close`](Self::close)) releases its
/// internal state. An exhausted sequence releases its state on the pull that
/// observes the end.
pub struct ShrinkSequence<T> {
    inner: Option<Box<dyn Iterator<Item = T>>>,
}

impl<T> ShrinkSequence<T> {
    /// A sequence with no candidates
    pub fn empty() -> Self {
        Self { inner: None }
    }

    /// Wrap an iterator of candidates
    pub fn new<I>(candidates: I) -> Self
    where
        I: Iterator<Item = T> + 'static,
    {
        Self {
            inner: Some(Box::new(candidates)),
        }
    }

    /// Build a sequence from a pull function; the first `None` ends it.
    pub fn from_fn<F>(pull: F) -> Self
    where
        F: FnMut() -> Option<T> + 'static,
    {
        Self::new(std::iter::from_fn(pull))
    }

    /// A sequence yielding exactly one candidate
    pub fn once(candidate: T) -> Self
    where
        T: 'static,
    {
        Self::new(std::iter::once(candidate))
    }

    /// Whether the sequence is known to have no further candidates
    pub fn is_exhausted(&self) -> bool {
        self.inner.is_none()
    }

    /// Release the sequence's state without pulling further candidates.
    pub fn close(self) {}

    /// Transform every candidate
    pub fn map<U, F>(self, mut f: F) -> ShrinkSequence<U>
    where
        T: 'static,
        F: FnMut(T) -> U + 'static,
    {
        match self.inner {
            Some(inner) => ShrinkSequence::new(inner.map(move |candidate| f(candidate))),
            None => ShrinkSequence::empty(),
        }
    }

    /// Skip candidates rejected by `predicate`
    pub fn filter<P>(self, predicate: P) -> Self
    where
        T: 'static,
        P: FnMut(&T) -> bool + 'static,
    {
        match self.inner {
            Some(inner) => Self::new(inner.filter(predicate)),
            None => Self::empty(),
        }
    }

    /// Yield this sequence's candidates, then `next`'s
    pub fn concat(self, next: ShrinkSequence<T>) -> Self
    where
        T: 'static,
    {
        match (self.inner, next.inner) {
            (Some(first), Some(second)) => Self::new(first.chain(second)),
            (Some(only), None) | (None, Some(only)) => Self { inner: Some(only) },
            (None, None) => Self::empty(),
        }
    }

    /// Yield every sequence's candidates in order.
    pub fn concat_all(sequences: Vec<ShrinkSequence<T>>) -> Self
    where
        T: 'static,
    {
        let live: Vec<ShrinkSequence<T>> = sequences
            .into_iter()
            .filter(|sequence| !sequence.is_exhausted())
            .collect();
        if live.is_empty() {
            return Self::empty();
        }
        Self::new(live.into_iter().flatten())
    }

    /// Yield the candidates of `count` sequences in order, building each one on demand.
    ///
    /// `build(i)` runs only once sequence `i - 1` is exhausted, so later parts
    /// cost nothing while an earlier part still has candidates.
    pub fn concat_with<F>(count: usize, mut build: F) -> Self
    where
        T: 'static,
        F: FnMut(usize) -> ShrinkSequence<T> + 'static,
    {
        let mut next_part = 0;
        let mut current = Self::empty();
        Self::from_fn(move || loop {
            if let Some(candidate) = current.next() {
                return Some(candidate);
            }
            if next_part == count {
                return None;
            }
            current = build(next_part);
            next_part += 1;
        })
    }
}

impl<T> Iterator for ShrinkSequence<T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        let candidate = self.inner.as_mut()?.next();
        if candidate.is_none() {
            self.inner = None;
        }
        candidate
    }
}

impl<T> std::iter::FusedIterator for ShrinkSequence<T> {}

impl<T> Default for ShrinkSequence<T> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<T> fmt::Debug for ShrinkSequence<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShrinkSequence")
            .field("exhausted", &self.is_exhausted())
            .finish()
    }
}

/// Bisection between a target and a known-failing integer.
///
/// The first candidate is the target itself. After that each pull treats the
/// previously yielded candidate as passing, moves the good bound onto it, and
/// yields the midpoint towards the failing value. The sequence ends once the
/// midpoint no longer moves, so it is at most logarithmic in the distance.
#[derive(Debug, Clone)]
pub struct IntShrink<T> {
    good: i128,
    bad: i128,
    last: Option<i128>,
    done: bool,
    _marker: std::marker::PhantomData<T>,
}

impl<T: ChoiceInt> IntShrink<T> {
    /// Shrink `value` towards `target`
    pub fn new(value: T, target: T) -> Self {
        Self {
            good: target.to_wide(),
            bad: value.to_wide(),
            last: None,
            done: value == target,
            _marker: std::marker::PhantomData,
        }
    }
}

impl<T: ChoiceInt> Iterator for IntShrink<T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        if self.done {
            return None;
        }
        let candidate = match self.last {
            None => self.good,
            Some(passed) => {
                self.good = passed;
                let mid = self.good + (self.bad - self.good) / 2;
                if mid == self.good {
                    self.done = true;
                    return None;
                }
                mid
            }
        };
        self.last = Some(candidate);
        Some(T::from_wide(candidate))
    }
}

impl<T: ChoiceInt> From<IntShrink<T>> for ShrinkSequence<T> {
    fn from(shrink: IntShrink<T>) -> Self {
        ShrinkSequence::new(shrink)
    }
}

/// Float types the float generators and shrinkers operate on.
pub trait FloatValue: num_traits::Float + fmt::Debug + 'static {
    /// Convert from `f64`, rounding if needed
    fn narrow(value: f64) -> Self;
    /// Convert to `f64`
    fn widen(self) -> f64;
}

impl FloatValue for f32 {
    fn narrow(value: f64) -> Self {
        value as f32
    }

    fn widen(self) -> f64 {
        f64::from(self)
    }
}

impl FloatValue for f64 {
    fn narrow(value: f64) -> Self {
        value
    }

    fn widen(self) -> f64 {
        self
    }
}

/// Float bisection, stopping once the bounds are within [`FLOAT_EPSILON`].
///
/// Non-finite values only ever shrink to the target.
#[derive(Debug, Clone)]
pub struct FloatShrink<F> {
    good: F,
    bad: F,
    last: Option<F>,
    done: bool,
    bisect: bool,
}

impl<F: FloatValue> FloatShrink<F> {
    /// Shrink `value` towards `target`
    pub fn new(value: F, target: F) -> Self {
        Self {
            good: target,
            bad: value,
            last: None,
            done: value == target,
            bisect: value.is_finite() && target.is_finite(),
        }
    }
}

impl<F: FloatValue> Iterator for FloatShrink<F> {
    type Item = F;

    fn next(&mut self) -> Option<F> {
        if self.done {
            return None;
        }
        let candidate = match self.last {
            None => self.good,
            Some(_) if !self.bisect => {
                self.done = true;
                return None;
            }
            Some(passed) => {
                self.good = passed;
                let distance = self.bad - self.good;
                let mid = self.good + distance / F::narrow(2.0);
                if distance.abs() < F::narrow(FLOAT_EPSILON) || mid == self.good || mid == self.bad {
                    self.done = true;
                    return None;
                }
                mid
            }
        };
        self.last = Some(candidate);
        Some(candidate)
    }
}

#[derive(Debug, Clone, Copy)]
enum ListPhase {
    Truncate,
    TrimEnd { good: usize },
    TrimStart { good: usize },
    RemoveOne { index: usize },
    Done,
}

/// Four-phase shrinker for sequences: truncate to the minimum length, bisect
/// a chunk off the end, bisect a chunk off the start, then drop single
/// elements one position at a time.
///
/// Candidates are always a contiguous run or a single-removal subsequence of
/// the original items, and never shorter than the minimum length.
#[derive(Debug, Clone)]
pub struct ListShrink<T> {
    items: Vec<T>,
    min_len: usize,
    phase: ListPhase,
}

impl<T: Clone> ListShrink<T> {
    /// Shrink `items` without going below `min_len` elements
    pub fn new(items: Vec<T>, min_len: usize) -> Self {
        Self {
            items,
            min_len,
            phase: ListPhase::Truncate,
        }
    }

    fn len(&self) -> usize {
        self.items.len()
    }

    /// Length kept by the next trim, or `None` once the bounds have met
    fn next_kept(&self, good: usize) -> Option<usize> {
        let kept = good + (self.len() - good) / 2;
        (kept != good).then_some(kept)
    }
}

/// Copy a slice into a fresh vector, giving up instead of aborting when the
/// allocation cannot be satisfied.
fn try_copy<T: Clone>(parts: &[&[T]]) -> Option<Vec<T>> {
    let total = parts.iter().map(|part| part.len()).sum();
    let mut copy = Vec::new();
    copy.try_reserve_exact(total).ok()?;
    for part in parts {
        copy.extend_from_slice(part);
    }
    Some(copy)
}

impl<T: Clone> Iterator for ListShrink<T> {
    type Item = Vec<T>;

    fn next(&mut self) -> Option<Vec<T>> {
        loop {
            match self.phase {
                ListPhase::Truncate => {
                    self.phase = ListPhase::TrimEnd { good: self.min_len };
                    if self.len() > self.min_len {
                        let candidate = try_copy(&[&self.items[..self.min_len]]);
                        if candidate.is_none() {
                            self.phase = ListPhase::Done;
                        }
                        return candidate;
                    }
                    self.phase = ListPhase::Done;
                }
                ListPhase::TrimEnd { good } => match self.next_kept(good) {
                    Some(kept) => {
                        self.phase = ListPhase::TrimEnd { good: kept };
                        return self.yield_or_stop(try_copy(&[&self.items[..kept]]));
                    }
                    None => self.phase = ListPhase::TrimStart { good: self.min_len },
                },
                ListPhase::TrimStart { good } => match self.next_kept(good) {
                    Some(kept) => {
                        self.phase = ListPhase::TrimStart { good: kept };
                        let start = self.len() - kept;
                        return self.yield_or_stop(try_copy(&[&self.items[start..]]));
                    }
                    None => self.phase = ListPhase::RemoveOne { index: 0 },
                },
                ListPhase::RemoveOne { index } => {
                    if index >= self.len() || self.len() - 1 < self.min_len {
                        self.phase = ListPhase::Done;
                        continue;
                    }
                    self.phase = ListPhase::RemoveOne { index: index + 1 };
                    let candidate =
                        try_copy(&[&self.items[..index], &self.items[index + 1..]]);
                    return self.yield_or_stop(candidate);
                }
                ListPhase::Done => return None,
            }
        }
    }
}

impl<T: Clone> ListShrink<T> {
    fn yield_or_stop(&mut self, candidate: Option<Vec<T>>) -> Option<Vec<T>> {
        if candidate.is_none() {
            self.phase = ListPhase::Done;
        }
        candidate
    }
}

enum OptionState<T> {
    YieldNone(ShrinkSequence<T>),
    Inner(ShrinkSequence<T>),
    Exhausted,
}

/// Shrinker for optional values: `None` first, then the inner value's own candidates.
///
/// "Already `None`" and "no more candidates" are separate states, so a
/// `None` candidate is never mistaken for the end of the sequence.
pub struct OptionShrink<T> {
    state: OptionState<T>,
}

impl<T> OptionShrink<T> {
    /// Shrink `Some(inner)` given the inner value's sequence; `None` values pass `None`.
    pub fn new(inner: Option<ShrinkSequence<T>>) -> Self {
        let state = match inner {
            Some(sequence) => OptionState::YieldNone(sequence),
            None => OptionState::Exhausted,
        };
        Self { state }
    }
}

impl<T> Iterator for OptionShrink<T> {
    type Item = Option<T>;

    fn next(&mut self) -> Option<Option<T>> {
        match std::mem::replace(&mut self.state, OptionState::Exhausted) {
            OptionState::YieldNone(inner) => {
                self.state = OptionState::Inner(inner);
                Some(None)
            }
            OptionState::Inner(mut inner) => {
                let candidate = inner.next()?;
                self.state = OptionState::Inner(inner);
                Some(Some(candidate))
            }
            OptionState::Exhausted => None,
        }
    }
}

/// Shrink a `true` to `false`
pub fn shrink_bool(value: bool) -> ShrinkSequence<bool> {
    if value {
        ShrinkSequence::once(false)
    } else {
        ShrinkSequence::empty()
    }
}

/// Shrink an index into a fixed table towards the first entry.
pub fn shrink_index<T>(table: std::rc::Rc<[T]>, index: usize) -> ShrinkSequence<T>
where
    T: Clone + 'static,
{
    ShrinkSequence::new(IntShrink::new(index, 0)).map(move |i| table[i].clone())
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use super::*;

    #[test]
    fn test_empty_sequence() {
        let mut sequence: ShrinkSequence<i32> = ShrinkSequence::empty();
        assert!(sequence.is_exhausted());
        assert_eq!(sequence.next(), None);
    }

    #[test]
    fn test_sequence_releases_state_when_exhausted() {
        let mut sequence = ShrinkSequence::new(vec![1, 2].into_iter());
        assert!(!sequence.is_exhausted());
        assert_eq!(sequence.next(), Some(1));
        assert_eq!(sequence.next(), Some(2));
        assert_eq!(sequence.next(), None);
        assert!(sequence.is_exhausted());
        assert_eq!(sequence.next(), None);
    }

    #[test]
    fn test_sequence_combinators() {
        let mapped: Vec<i32> = ShrinkSequence::new(1..4).map(|x| x * 10).collect();
        assert_eq!(mapped, vec![10, 20, 30]);

        let filtered: Vec<i32> = ShrinkSequence::new(1..7).filter(|x| x % 2 == 0).collect();
        assert_eq!(filtered, vec![2, 4, 6]);

        let joined: Vec<i32> = ShrinkSequence::new(1..3)
            .concat(ShrinkSequence::empty())
            .concat(ShrinkSequence::once(9))
            .collect();
        assert_eq!(joined, vec![1, 2, 9]);

        let all: Vec<i32> = ShrinkSequence::concat_all(vec![
            ShrinkSequence::empty(),
            ShrinkSequence::once(1),
            ShrinkSequence::new(2..4),
        ])
        .collect();
        assert_eq!(all, vec![1, 2, 3]);
    }

    #[test]
    fn test_concat_with_builds_parts_on_demand() {
        let built = Rc::new(Cell::new(0));
        let mut sequence = ShrinkSequence::concat_with(3, {
            let built = Rc::clone(&built);
            move |part| {
                built.set(built.get() + 1);
                match part {
                    0 => ShrinkSequence::new(1..3),
                    1 => ShrinkSequence::empty(),
                    _ => ShrinkSequence::once(9),
                }
            }
        });

        assert_eq!(built.get(), 0);
        assert_eq!(sequence.next(), Some(1));
        assert_eq!(sequence.next(), Some(2));
        assert_eq!(built.get(), 1);
        assert_eq!(sequence.next(), Some(9));
        assert_eq!(built.get(), 3);
        assert_eq!(sequence.next(), None);
        assert!(sequence.is_exhausted());
        assert_eq!(built.get(), 3);
    }

    #[test]
    fn test_int_shrink_bisects_towards_target() {
        let candidates: Vec<i32> = IntShrink::new(100, 0).collect();
        assert_eq!(candidates, vec![0, 50, 75, 87, 93, 96, 98, 99]);
    }

    #[test]
    fn test_int_shrink_negative_values() {
        let candidates: Vec<i64> = IntShrink::new(-10, 0).collect();
        assert_eq!(candidates.first(), Some(&0));
        assert!(candidates.iter().all(|c| (-10..=0).contains(c) && *c != -10));
    }

    #[test]
    fn test_int_shrink_at_target_is_empty() {
        assert_eq!(IntShrink::new(0u8, 0).count(), 0);
        assert_eq!(IntShrink::new(10i16, 10).count(), 0);
    }

    #[test]
    fn test_int_shrink_adjacent() {
        let candidates: Vec<u32> = IntShrink::new(1, 0).collect();
        assert_eq!(candidates, vec![0]);
    }

    #[test]
    fn test_int_shrink_extreme_bounds() {
        let candidates: Vec<i64> = IntShrink::new(i64::MIN, i64::MAX).collect();
        assert!(!candidates.is_empty());
        assert!(candidates.len() <= 66);
        assert_eq!(candidates[0], i64::MAX);

        let candidates: Vec<u64> = IntShrink::new(u64::MAX, 0).collect();
        assert!(candidates.len() <= 66);
    }

    #[test]
    fn test_float_shrink_converges() {
        let candidates: Vec<f64> = FloatShrink::new(8.0, 0.0).collect();
        assert_eq!(candidates[0], 0.0);
        assert_eq!(candidates[1], 4.0);
        assert!(candidates.len() < 40);
        assert!(candidates.iter().all(|c| (0.0..8.0).contains(c)));
    }

    #[test]
    fn test_float_shrink_huge_value_terminates() {
        let count = FloatShrink::new(f64::MAX, 0.0).count();
        assert!(count > 1 && count < 1200);
    }

    #[test]
    fn test_float_shrink_non_finite() {
        let candidates: Vec<f64> = FloatShrink::new(f64::INFINITY, 0.0).collect();
        assert_eq!(candidates, vec![0.0]);

        let candidates: Vec<f32> = FloatShrink::new(f32::NAN, 1.0).collect();
        assert_eq!(candidates, vec![1.0]);

        assert_eq!(FloatShrink::new(0.0f64, 0.0).count(), 0);
    }

    #[test]
    fn test_list_shrink_phases() {
        let candidates: Vec<Vec<i32>> = ListShrink::new(vec![1, 2, 3, 4], 0).collect();
        assert_eq!(
            candidates,
            vec![
                vec![],
                vec![1, 2],
                vec![1, 2, 3],
                vec![3, 4],
                vec![2, 3, 4],
                vec![2, 3, 4],
                vec![1, 3, 4],
                vec![1, 2, 4],
                vec![1, 2, 3],
            ]
        );
    }

    #[test]
    fn test_list_shrink_respects_min_len() {
        let candidates: Vec<Vec<char>> = ListShrink::new(vec!['a', 'b', 'c'], 2).collect();
        assert_eq!(candidates[0], vec!['a', 'b']);
        assert!(candidates.iter().all(|c| c.len() >= 2));
    }

    #[test]
    fn test_list_shrink_at_minimum_is_empty() {
        assert_eq!(ListShrink::<u8>::new(vec![], 0).count(), 0);
        assert_eq!(ListShrink::new(vec![1, 2], 2).count(), 0);
    }

    #[test]
    fn test_list_shrink_single_element() {
        let candidates: Vec<Vec<i32>> = ListShrink::new(vec![7], 0).collect();
        assert_eq!(candidates, vec![vec![], vec![]]);
    }

    #[test]
    fn test_option_shrink_yields_none_first() {
        let inner = ShrinkSequence::new(IntShrink::new(4i32, 0));
        let candidates: Vec<Option<i32>> = OptionShrink::new(Some(inner)).collect();
        assert_eq!(candidates, vec![None, Some(0), Some(2), Some(3)]);
    }

    #[test]
    fn test_option_shrink_none_is_exhausted() {
        assert_eq!(OptionShrink::<i32>::new(None).count(), 0);
    }

    #[test]
    fn test_option_shrink_with_unshrinkable_inner() {
        let candidates: Vec<Option<u8>> =
            OptionShrink::new(Some(ShrinkSequence::empty())).collect();
        assert_eq!(candidates, vec![None]);
    }

    #[test]
    fn test_bool_and_index_shrink() {
        assert_eq!(shrink_bool(true).collect::<Vec<_>>(), vec![false]);
        assert_eq!(shrink_bool(false).count(), 0);

        let table: std::rc::Rc<[char]> = vec!['a', 'b', 'c', 'd'].into();
        let candidates: Vec<char> = shrink_index(table, 3).collect();
        assert_eq!(candidates, vec!['a', 'b', 'c']);
    }
}
