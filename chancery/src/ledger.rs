//! The choice ledger: the single point where randomness enters generation.
//!
//! Every generator, whatever the shape of its values, is built from
//! [`ChoiceLedger::choice`]. The ledger records each draw so a failing value
//! can be traced back to the exact decisions that produced it, and it caps the
//! number of draws per attempt so that runaway generators (unbounded recursion,
//! huge collections) fail with [`GenError::Overrun`] instead of spinning.

use std::fmt::Debug;

use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};

use crate::error::GenError;

/// Default number of draws allowed per generation attempt
pub const DEFAULT_MAX_CHOICES: usize = 1024;

/// Seed of the fallback source a replayed ledger continues with once its prefix is consumed
const REPLAY_FALLBACK_SEED: u64 = 0;

/// Records every primitive random decision made while producing one value.
#[derive(Debug)]
pub struct ChoiceLedger {
    rng: StdRng,
    choices: Vec<u64>,
    max_choices: usize,
    prefix: Vec<u64>,
}

impl ChoiceLedger {
    /// Create a ledger with the default choice budget
    pub fn new(seed: u64) -> Self {
        Self::with_budget(seed, DEFAULT_MAX_CHOICES)
    }

    /// Create a ledger allowing at most `max_choices` draws
    pub fn with_budget(seed: u64, max_choices: usize) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            choices: Vec::new(),
            max_choices,
            prefix: Vec::new(),
        }
    }

    /// Create a ledger whose first draws are forced from a recorded trace.
    ///
    /// Once the prefix is consumed, draws continue from a fixed fallback source,
    /// so replaying the same prefix is always deterministic.
    pub fn replay(prefix: impl Into<Vec<u64>>, max_choices: usize) -> Self {
        Self {
            prefix: prefix.into(),
            ..Self::with_budget(REPLAY_FALLBACK_SEED, max_choices)
        }
    }

    /// Draws recorded so far, in order
    pub fn choices(&self) -> &[u64] {
        &self.choices
    }

    /// Consume the ledger, keeping its recorded draws
    pub fn into_choices(self) -> Vec<u64> {
        self.choices
    }

    /// Number of draws still allowed in this attempt
    pub fn remaining(&self) -> usize {
        self.max_choices.saturating_sub(self.choices.len())
    }

    /// Draw uniformly from `[0, n]` and record the draw.
    pub fn choice(&mut self, n: u64) -> Result<u64, GenError> {
        if self.choices.len() >= self.max_choices {
            return Err(GenError::choice_overrun(self.max_choices));
        }

        let value = match self.prefix.get(self.choices.len()) {
            Some(&forced) if forced > n => {
                return Err(GenError::invalid(format!(
                    "replayed choice {} exceeds bound {} at position {}",
                    forced,
                    n,
                    self.choices.len()
                )));
            }
            Some(&forced) => forced,
            None if n == u64::MAX => self.rng.next_u64(),
            None => self.rng.gen_range(0..=n),
        };

        self.choices.push(value);
        Ok(value)
    }

    /// Draw a single binary decision
    pub fn flip(&mut self) -> Result<bool, GenError> {
        Ok(self.choice(1)? == 1)
    }

    /// Draw a value in `[min, max]` with a single choice over the span.
    pub fn choice_in_range<T: ChoiceInt>(&mut self, min: T, max: T) -> Result<T, GenError> {
        if min > max {
            return Err(GenError::invalid(format!(
                "inverted range [{:?}, {:?}]",
                min, max
            )));
        }
        // the span of any supported type fits in u64 once computed in i128
        let span = (max.to_wide() - min.to_wide()) as u64;
        let offset = self.choice(span)?;
        Ok(T::from_wide(min.to_wide() + i128::from(offset)))
    }

    /// Pick an index with probability proportional to its weight.
    pub fn weighted_choice(&mut self, weights: &[u64]) -> Result<usize, GenError> {
        let total = total_weight(weights)?;
        let draw = self.choice(total - 1)?;

        let mut cumulative = 0u64;
        for (index, &weight) in weights.iter().enumerate() {
            cumulative += weight;
            if draw < cumulative {
                return Ok(index);
            }
        }
        Err(GenError::invalid("weighted draw fell outside every bucket"))
    }
}

/// Sum a weight set, rejecting empty, all-zero and overflowing sets.
pub(crate) fn total_weight(weights: &[u64]) -> Result<u64, GenError> {
    if weights.is_empty() {
        return Err(GenError::invalid("empty weight set"));
    }
    let total = weights
        .iter()
        .try_fold(0u64, |acc, &w| acc.checked_add(w))
        .ok_or_else(|| GenError::invalid("weight sum overflows u64"))?;
    if total == 0 {
        return Err(GenError::invalid("all weights are zero"));
    }
    Ok(total)
}

/// Integer types the ledger can draw directly.
pub trait ChoiceInt: Copy + Ord + Debug + 'static {
    /// Smallest value of the type
    const MIN: Self;
    /// Largest value of the type
    const MAX: Self;
    /// All-ones bit pattern of the type's width
    const BIT_MASK: u64;

    /// Widen to a type that holds every value of every supported width
    fn to_wide(self) -> i128;

    /// Narrow back from the wide representation
    fn from_wide(wide: i128) -> Self;

    /// Reinterpret the low bits of a draw as a value of this type
    fn from_bits(bits: u64) -> Self;
}

macro_rules! impl_choice_int {
    ($($t:ty => $bits:ty),*) => {
        $(
            impl ChoiceInt for $t {
                const MIN: Self = <$t>::MIN;
                const MAX: Self = <$t>::MAX;
                const BIT_MASK: u64 = <$bits>::MAX as u64;

                fn to_wide(self) -> i128 {
                    self as i128
                }

                fn from_wide(wide: i128) -> Self {
                    wide as $t
                }

                fn from_bits(bits: u64) -> Self {
                    bits as $bits as $t
                }
            }
        )*
    };
}

impl_choice_int!(
    u8 => u8, u16 => u16, u32 => u32, u64 => u64, usize => usize,
    i8 => u8, i16 => u16, i32 => u32, i64 => u64, isize => usize
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_choice_stays_in_bounds() {
        let mut ledger = ChoiceLedger::new(1);
        for n in [0u64, 1, 2, 10, 1000, u64::MAX] {
            for _ in 0..50 {
                let value = ledger.choice(n).unwrap();
                assert!(value <= n);
            }
        }
    }

    #[test]
    fn test_choice_zero_is_always_zero() {
        let mut ledger = ChoiceLedger::new(3);
        assert_eq!(ledger.choice(0).unwrap(), 0);
    }

    #[test]
    fn test_choices_are_recorded_in_order() {
        let mut ledger = ChoiceLedger::new(42);
        let drawn: Vec<u64> = (0..5).map(|_| ledger.choice(100).unwrap()).collect();
        assert_eq!(ledger.choices(), drawn.as_slice());
        assert_eq!(ledger.into_choices(), drawn);
    }

    #[test]
    fn test_same_seed_same_draws() {
        let mut a = ChoiceLedger::new(2024);
        let mut b = ChoiceLedger::new(2024);
        for _ in 0..20 {
            assert_eq!(a.choice(1 << 40).unwrap(), b.choice(1 << 40).unwrap());
        }
    }

    #[test]
    fn test_budget_overrun() {
        let mut ledger = ChoiceLedger::with_budget(0, 3);
        for _ in 0..3 {
            assert!(ledger.choice(10).is_ok());
        }
        assert_eq!(ledger.remaining(), 0);
        assert_eq!(ledger.choice(10), Err(GenError::choice_overrun(3)));
        assert_eq!(ledger.choices().len(), 3);
    }

    #[test]
    fn test_choice_in_range_extremes() {
        let mut ledger = ChoiceLedger::new(9);
        for _ in 0..100 {
            ledger.choice_in_range(i64::MIN, i64::MAX).unwrap();
            ledger.choice_in_range(u64::MIN, u64::MAX).unwrap();
            let small = ledger.choice_in_range(-3i8, 3).unwrap();
            assert!((-3..=3).contains(&small));
        }
        assert_eq!(ledger.choice_in_range(7u16, 7).unwrap(), 7);
    }

    #[test]
    fn test_choice_in_range_inverted() {
        let mut ledger = ChoiceLedger::new(0);
        assert!(matches!(
            ledger.choice_in_range(10i32, 1),
            Err(GenError::InvalidChoice(_))
        ));
        assert!(ledger.choices().is_empty());
    }

    #[test]
    fn test_weighted_choice_respects_zero_weights() {
        let mut ledger = ChoiceLedger::new(5);
        for _ in 0..200 {
            let index = ledger.weighted_choice(&[0, 3, 0, 1]).unwrap();
            assert!(index == 1 || index == 3);
        }
    }

    #[test]
    fn test_weighted_choice_single_bucket() {
        let mut ledger = ChoiceLedger::new(5);
        assert_eq!(ledger.weighted_choice(&[7]).unwrap(), 0);
    }

    #[test]
    fn test_weighted_choice_invalid_sets() {
        let mut ledger = ChoiceLedger::new(5);
        assert!(matches!(
            ledger.weighted_choice(&[]),
            Err(GenError::InvalidChoice(_))
        ));
        assert!(matches!(
            ledger.weighted_choice(&[0, 0]),
            Err(GenError::InvalidChoice(_))
        ));
        assert!(matches!(
            ledger.weighted_choice(&[u64::MAX, 1]),
            Err(GenError::InvalidChoice(_))
        ));
    }

    #[test]
    fn test_weighted_choice_bucket_boundaries() {
        // draws 0..=1 land in bucket 0, 2 in bucket 1, 3..=5 in bucket 2
        let cases = [(0, 0), (1, 0), (2, 1), (3, 2), (5, 2)];
        for (draw, expected) in cases {
            let mut ledger = ChoiceLedger::replay(vec![draw], 8);
            assert_eq!(ledger.weighted_choice(&[2, 1, 3]).unwrap(), expected);
        }
    }

    #[test]
    fn test_replay_forces_prefix() {
        let mut ledger = ChoiceLedger::replay(vec![3, 0, 9], 16);
        assert_eq!(ledger.choice(10).unwrap(), 3);
        assert_eq!(ledger.choice(10).unwrap(), 0);
        assert_eq!(ledger.choice(10).unwrap(), 9);
        // past the prefix draws still stay in bounds
        assert!(ledger.choice(4).unwrap() <= 4);
    }

    #[test]
    fn test_replay_rejects_out_of_bound_prefix() {
        let mut ledger = ChoiceLedger::replay(vec![11], 16);
        assert!(matches!(ledger.choice(10), Err(GenError::InvalidChoice(_))));
    }

    #[test]
    fn test_signed_bit_reinterpretation() {
        assert_eq!(i8::from_bits(0xff), -1);
        assert_eq!(i8::from_bits(0x80), i8::MIN);
        assert_eq!(i32::from_bits(u64::from(u32::MAX)), -1);
        assert_eq!(u16::from_bits(0x1_0001), 1);
        assert_eq!(i16::BIT_MASK, u64::from(u16::MAX));
    }
}
