//! Generators for primitive types, collections and optional values.

use std::collections::HashMap;
use std::hash::Hash;
use std::rc::Rc;

use crate::error::GenError;
use crate::generator::Generator;
use crate::ledger::{ChoiceInt, ChoiceLedger};
use crate::shrink::{
    FloatShrink, FloatValue, IntShrink, ListShrink, OptionShrink, ShrinkSequence, shrink_bool,
    shrink_index,
};

/// Lowercase letters, uppercase letters, then digits
pub const ALPHANUMERIC: &str = "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
/// Lowercase ASCII letters
pub const ALPHA_LOWER: &str = "abcdefghijklmnopqrstuvwxyz";
/// Decimal digits
pub const DIGITS: &str = "0123456789";
/// Printable ASCII, from space to tilde
pub const ASCII_PRINTABLE: &str = " !\"#$%&'()*+,-./0123456789:;<=>?@ABCDEFGHIJKLMNOPQRSTUVWXYZ[\\]^_`abcdefghijklmnopqrstuvwxyz{|}~";

/// Draws for the mantissa of a wide-range float: 53 bits of precision
const MANTISSA_SPAN: u64 = (1 << 53) - 1;
const MANTISSA_SCALE: f64 = (1u64 << 53) as f64;
/// Decimal exponent range of wide-range floats
const MIN_EXPONENT: i32 = -20;
const MAX_EXPONENT: i32 = 20;

fn check_range<T: PartialOrd + std::fmt::Debug>(min: T, max: T) -> Result<(), GenError> {
    if min > max {
        return Err(GenError::invalid(format!(
            "inverted range [{:?}, {:?}]",
            min, max
        )));
    }
    Ok(())
}

/// Generator for booleans
#[derive(Debug, Clone, Copy, Default)]
pub struct BoolGenerator;

impl Generator for BoolGenerator {
    type Value = bool;

    fn produce(&self, ledger: &mut ChoiceLedger) -> Result<bool, GenError> {
        ledger.flip()
    }

    fn shrink(&self, value: &bool) -> ShrinkSequence<bool> {
        shrink_bool(*value)
    }
}

/// Fair booleans; shrinks `true` to `false`
pub fn bools() -> BoolGenerator {
    BoolGenerator
}

/// Generator for integers in an inclusive range
#[derive(Debug, Clone, Copy)]
pub struct IntGenerator<T> {
    min: T,
    max: T,
    target: T,
}

impl<T: ChoiceInt> IntGenerator<T> {
    /// Every value of the type
    pub fn full_range() -> Self {
        Self {
            min: T::MIN,
            max: T::MAX,
            target: T::from_wide(0),
        }
    }

    /// Shrink towards `target` instead of the value closest to zero.
    ///
    /// A target outside the range is clamped into it.
    pub fn with_target(mut self, target: T) -> Self {
        self.target = target.clamp(self.min, self.max);
        self
    }

    fn is_full_range(&self) -> bool {
        self.min == T::MIN && self.max == T::MAX
    }
}

impl<T: ChoiceInt> Generator for IntGenerator<T> {
    type Value = T;

    fn produce(&self, ledger: &mut ChoiceLedger) -> Result<T, GenError> {
        if self.is_full_range() {
            // draw every bit of the type so signed minimums are as likely as anything else
            return Ok(T::from_bits(ledger.choice(T::BIT_MASK)?));
        }
        ledger.choice_in_range(self.min, self.max)
    }

    fn shrink(&self, value: &T) -> ShrinkSequence<T> {
        IntShrink::new(*value, self.target).into()
    }
}

/// Integers in `[min, max]`, shrinking towards the value in range closest to zero.
pub fn ints<T: ChoiceInt>(min: T, max: T) -> Result<IntGenerator<T>, GenError> {
    check_range(min, max)?;
    let target = T::from_wide(0i128.clamp(min.to_wide(), max.to_wide()));
    Ok(IntGenerator { min, max, target })
}

/// Integers covering the whole type
pub fn any_int<T: ChoiceInt>() -> IntGenerator<T> {
    IntGenerator::full_range()
}

#[derive(Debug, Clone, Copy)]
enum FloatMode<F> {
    Wide,
    Range { min: F, max: F },
}

/// Generator for floating point numbers
#[derive(Debug, Clone, Copy)]
pub struct FloatGenerator<F> {
    mode: FloatMode<F>,
    target: F,
}

impl<F: FloatValue> Generator for FloatGenerator<F> {
    type Value = F;

    fn produce(&self, ledger: &mut ChoiceLedger) -> Result<F, GenError> {
        match self.mode {
            FloatMode::Wide => {
                let mantissa = ledger.choice(MANTISSA_SPAN)? as f64 / MANTISSA_SCALE;
                let exponent = ledger.choice_in_range(MIN_EXPONENT, MAX_EXPONENT)?;
                let negative = ledger.flip()?;
                let magnitude = mantissa * 10f64.powi(exponent);
                Ok(F::narrow(if negative { -magnitude } else { magnitude }))
            }
            FloatMode::Range { min, max } => {
                let fraction = ledger.choice(MANTISSA_SPAN + 1)? as f64 / MANTISSA_SCALE;
                // interpolate without computing max - min, which can overflow
                let value = min.widen() * (1.0 - fraction) + max.widen() * fraction;
                Ok(F::narrow(value).max(min).min(max))
            }
        }
    }

    fn shrink(&self, value: &F) -> ShrinkSequence<F> {
        ShrinkSequence::new(FloatShrink::new(*value, self.target))
    }
}

/// `f64` values across many orders of magnitude, with either sign
pub fn floats() -> FloatGenerator<f64> {
    wide_floats()
}

/// `f32` values across many orders of magnitude, with either sign
pub fn floats32() -> FloatGenerator<f32> {
    wide_floats()
}

fn wide_floats<F: FloatValue>() -> FloatGenerator<F> {
    FloatGenerator {
        mode: FloatMode::Wide,
        target: F::zero(),
    }
}

/// Floats in `[min, max]`. Both bounds must be finite.
pub fn float_range<F: FloatValue>(min: F, max: F) -> Result<FloatGenerator<F>, GenError> {
    if !min.is_finite() || !max.is_finite() {
        return Err(GenError::invalid(format!(
            "non-finite float bounds [{:?}, {:?}]",
            min, max
        )));
    }
    check_range(min, max)?;
    Ok(FloatGenerator {
        mode: FloatMode::Range { min, max },
        target: F::zero().max(min).min(max),
    })
}

/// Generator picking characters from a fixed table
#[derive(Debug, Clone)]
pub struct CharGenerator {
    table: Rc<[char]>,
}

impl CharGenerator {
    pub(crate) fn printable() -> Self {
        Self {
            table: ASCII_PRINTABLE.chars().collect(),
        }
    }

    fn pick(&self, ledger: &mut ChoiceLedger) -> Result<char, GenError> {
        let index = ledger.choice(self.table.len() as u64 - 1)?;
        Ok(self.table[index as usize])
    }

    fn shrink_char(&self, value: char) -> ShrinkSequence<char> {
        match self.table.iter().position(|&c| c == value) {
            Some(index) => shrink_index(Rc::clone(&self.table), index),
            None => ShrinkSequence::empty(),
        }
    }
}

impl Generator for CharGenerator {
    type Value = char;

    fn produce(&self, ledger: &mut ChoiceLedger) -> Result<char, GenError> {
        self.pick(ledger)
    }

    fn shrink(&self, value: &char) -> ShrinkSequence<char> {
        self.shrink_char(*value)
    }
}

/// Characters drawn uniformly from `charset`, shrinking towards its first character.
pub fn chars_from(charset: &str) -> Result<CharGenerator, GenError> {
    let table: Rc<[char]> = charset.chars().collect();
    if table.is_empty() {
        return Err(GenError::invalid("empty character set"));
    }
    Ok(CharGenerator { table })
}

/// Generator for strings over a character table
#[derive(Debug, Clone)]
pub struct StringGenerator {
    chars: CharGenerator,
    min_len: usize,
    max_len: usize,
}

impl StringGenerator {
    pub(crate) fn printable(max_len: usize) -> Self {
        Self {
            chars: CharGenerator::printable(),
            min_len: 0,
            max_len,
        }
    }
}

impl Generator for StringGenerator {
    type Value = String;

    fn produce(&self, ledger: &mut ChoiceLedger) -> Result<String, GenError> {
        let len = ledger.choice_in_range(self.min_len, self.max_len)?;
        let mut value = String::new();
        // each character costs at least one draw, so the budget bounds the reservation
        value.try_reserve(len.min(ledger.remaining()))?;
        for _ in 0..len {
            value.push(self.chars.pick(ledger)?);
        }
        Ok(value)
    }

    /// Removes characters first, then simplifies the survivors one position at a time.
    fn shrink(&self, value: &String) -> ShrinkSequence<String> {
        let chars: Vec<char> = value.chars().collect();
        let mut phases = vec![ShrinkSequence::new(ListShrink::new(chars.clone(), self.min_len))];
        let chars = Rc::new(chars);
        for (index, &c) in chars.iter().enumerate() {
            let base = Rc::clone(&chars);
            phases.push(self.chars.shrink_char(c).map(move |replacement| {
                let mut candidate = base.as_ref().clone();
                candidate[index] = replacement;
                candidate
            }));
        }
        ShrinkSequence::concat_all(phases).map(|candidate| candidate.into_iter().collect())
    }
}

/// Strings of `min_len..=max_len` characters drawn from `charset`
pub fn strings_from(
    charset: &str,
    min_len: usize,
    max_len: usize,
) -> Result<StringGenerator, GenError> {
    check_range(min_len, max_len)?;
    Ok(StringGenerator {
        chars: chars_from(charset)?,
        min_len,
        max_len,
    })
}

/// Alphanumeric strings of `min_len..=max_len` characters
pub fn alphanumeric_strings(min_len: usize, max_len: usize) -> Result<StringGenerator, GenError> {
    strings_from(ALPHANUMERIC, min_len, max_len)
}

/// Shrink candidates replacing one element at a time with its own candidates.
fn elementwise<T, G>(element: &G, items: &[T]) -> Vec<ShrinkSequence<Vec<T>>>
where
    G: Generator<Value = T>,
    T: Clone + 'static,
{
    let base: Rc<[T]> = items.into();
    items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            let base = Rc::clone(&base);
            element.shrink(item).map(move |replacement| {
                let mut candidate = base.to_vec();
                candidate[index] = replacement;
                candidate
            })
        })
        .collect()
}

/// Generator for vectors of independently drawn elements
#[derive(Debug, Clone)]
pub struct VecGenerator<G> {
    element: G,
    min_len: usize,
    max_len: usize,
}

impl<G> VecGenerator<G> {
    pub(crate) fn up_to(element: G, max_len: usize) -> Self {
        Self {
            element,
            min_len: 0,
            max_len,
        }
    }
}

impl<G> Generator for VecGenerator<G>
where
    G: Generator,
    G::Value: Clone + 'static,
{
    type Value = Vec<G::Value>;

    fn produce(&self, ledger: &mut ChoiceLedger) -> Result<Self::Value, GenError> {
        let len = ledger.choice_in_range(self.min_len, self.max_len)?;
        let mut items = Vec::new();
        items.try_reserve_exact(len.min(ledger.remaining()))?;
        for _ in 0..len {
            items.push(self.element.produce(ledger)?);
        }
        Ok(items)
    }

    /// Removes elements first, then shrinks the remaining elements one position at a time.
    fn shrink(&self, value: &Self::Value) -> ShrinkSequence<Self::Value> {
        let mut phases = vec![ShrinkSequence::new(ListShrink::new(value.clone(), self.min_len))];
        phases.extend(elementwise(&self.element, value));
        ShrinkSequence::concat_all(phases)
    }
}

/// Vectors of `min_len..=max_len` elements
pub fn vecs<G: Generator>(
    element: G,
    min_len: usize,
    max_len: usize,
) -> Result<VecGenerator<G>, GenError> {
    check_range(min_len, max_len)?;
    Ok(VecGenerator {
        element,
        min_len,
        max_len,
    })
}

/// Generator for fixed-size arrays
#[derive(Debug, Clone)]
pub struct ArrayGenerator<G, const N: usize> {
    element: G,
}

impl<G, const N: usize> Generator for ArrayGenerator<G, N>
where
    G: Generator,
    G::Value: Clone + 'static,
{
    type Value = [G::Value; N];

    fn produce(&self, ledger: &mut ChoiceLedger) -> Result<Self::Value, GenError> {
        let mut items = Vec::new();
        items.try_reserve_exact(N)?;
        for _ in 0..N {
            items.push(self.element.produce(ledger)?);
        }
        <[G::Value; N]>::try_from(items)
            .map_err(|items| GenError::invalid(format!("expected {} elements, got {}", N, items.len())))
    }

    fn shrink(&self, value: &Self::Value) -> ShrinkSequence<Self::Value> {
        let candidates = ShrinkSequence::concat_all(elementwise(&self.element, value.as_slice()));
        ShrinkSequence::new(candidates.filter_map(|items| <[G::Value; N]>::try_from(items).ok()))
    }
}

/// Arrays of `N` independently drawn elements
pub fn arrays<const N: usize, G: Generator>(element: G) -> ArrayGenerator<G, N> {
    ArrayGenerator { element }
}

/// Generator for hash maps
#[derive(Debug, Clone)]
pub struct HashMapGenerator<K, V> {
    keys: K,
    values: V,
    min_len: usize,
    max_len: usize,
}

impl<K, V> Generator for HashMapGenerator<K, V>
where
    K: Generator,
    V: Generator,
    K::Value: Eq + Hash + Clone + 'static,
    V::Value: Clone + 'static,
{
    type Value = HashMap<K::Value, V::Value>;

    fn produce(&self, ledger: &mut ChoiceLedger) -> Result<Self::Value, GenError> {
        let count = ledger.choice_in_range(self.min_len, self.max_len)?;
        let mut map = HashMap::new();
        map.try_reserve(count.min(ledger.remaining()))?;
        for _ in 0..count {
            let key = self.keys.produce(ledger)?;
            let value = self.values.produce(ledger)?;
            map.insert(key, value);
        }
        Ok(map)
    }

    /// Removes entries with the list shrinker, then shrinks values in place.
    fn shrink(&self, value: &Self::Value) -> ShrinkSequence<Self::Value> {
        let entries: Vec<(K::Value, V::Value)> =
            value.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
        let values: Vec<V::Value> = entries.iter().map(|(_, v)| v.clone()).collect();
        let keys: Rc<[K::Value]> = entries.iter().map(|(k, _)| k.clone()).collect();

        let removals = ShrinkSequence::new(ListShrink::new(entries, self.min_len))
            .map(|entries| entries.into_iter().collect::<HashMap<_, _>>());
        let in_place = ShrinkSequence::concat_all(elementwise(&self.values, &values)).map(
            move |values| keys.iter().cloned().zip(values).collect::<HashMap<_, _>>(),
        );
        removals.concat(in_place)
    }
}

/// Maps built from `min_len..=max_len` drawn entries; duplicate keys overwrite,
/// so a map may end up smaller than the drawn count.
pub fn hash_maps<K: Generator, V: Generator>(
    keys: K,
    values: V,
    min_len: usize,
    max_len: usize,
) -> Result<HashMapGenerator<K, V>, GenError> {
    check_range(min_len, max_len)?;
    Ok(HashMapGenerator {
        keys,
        values,
        min_len,
        max_len,
    })
}

/// Generator for optional values
#[derive(Debug, Clone)]
pub struct OptionGenerator<G> {
    inner: G,
}

impl<G> Generator for OptionGenerator<G>
where
    G: Generator,
    G::Value: 'static,
{
    type Value = Option<G::Value>;

    fn produce(&self, ledger: &mut ChoiceLedger) -> Result<Self::Value, GenError> {
        if ledger.flip()? {
            Ok(Some(self.inner.produce(ledger)?))
        } else {
            Ok(None)
        }
    }

    fn shrink(&self, value: &Self::Value) -> ShrinkSequence<Self::Value> {
        let inner = value.as_ref().map(|inner| self.inner.shrink(inner));
        ShrinkSequence::new(OptionShrink::new(inner))
    }
}

/// `None` or `Some` value from `inner`, decided by one binary choice
pub fn options<G: Generator>(inner: G) -> OptionGenerator<G> {
    OptionGenerator { inner }
}

/// Generator picking from a fixed list of values
#[derive(Debug, Clone)]
pub struct ElementOf<T> {
    values: Rc<[T]>,
}

impl<T> Generator for ElementOf<T>
where
    T: Clone + PartialEq + 'static,
{
    type Value = T;

    fn produce(&self, ledger: &mut ChoiceLedger) -> Result<T, GenError> {
        if self.values.is_empty() {
            return Err(GenError::invalid("element_of over an empty list"));
        }
        let index = ledger.choice(self.values.len() as u64 - 1)?;
        Ok(self.values[index as usize].clone())
    }

    fn shrink(&self, value: &T) -> ShrinkSequence<T> {
        match self.values.iter().position(|candidate| candidate == value) {
            Some(index) => shrink_index(Rc::clone(&self.values), index),
            None => ShrinkSequence::empty(),
        }
    }
}

/// One of `values`, uniformly, shrinking towards the first entry
pub fn element_of<T: Clone + PartialEq + 'static>(values: Vec<T>) -> ElementOf<T> {
    ElementOf {
        values: values.into(),
    }
}

/// Version 4 UUID strings built from two 64-bit draws
pub fn uuids() -> impl Generator<Value = String> {
    (any_int::<u64>(), any_int::<u64>()).map(|(high, low)| format_uuid(high, low))
}

fn format_uuid(high: u64, low: u64) -> String {
    let high = (high & !0xf000u64) | 0x4000;
    let low = (low & !(0b11u64 << 62)) | (0b10u64 << 62);
    format!(
        "{:08x}-{:04x}-{:04x}-{:04x}-{:012x}",
        high >> 32,
        (high >> 16) & 0xffff,
        high & 0xffff,
        low >> 48,
        low & 0xffff_ffff_ffff
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::DEFAULT_MAX_CHOICES;

    fn ledger(seed: u64) -> ChoiceLedger {
        ChoiceLedger::new(seed)
    }

    #[test]
    fn test_ints_stay_in_range() {
        let generator = ints(-20i16, 35).unwrap();
        let mut ledger = ledger(1);
        for _ in 0..200 {
            let value = generator.produce(&mut ledger).unwrap();
            assert!((-20..=35).contains(&value));
        }
    }

    #[test]
    fn test_ints_inverted_range() {
        assert!(matches!(ints(5u8, 4), Err(GenError::InvalidChoice(_))));
    }

    #[test]
    fn test_int_target_is_closest_to_zero() {
        let positive = ints(10i32, 100).unwrap();
        assert_eq!(positive.shrink(&11).next(), Some(10));

        let negative = ints(-100i32, -10).unwrap();
        assert_eq!(negative.shrink(&-50).next(), Some(-10));

        let spanning = ints(-100i32, 100).unwrap();
        assert_eq!(spanning.shrink(&-50).next(), Some(0));

        assert_eq!(positive.shrink(&10).count(), 0);
    }

    #[test]
    fn test_with_target() {
        let generator = ints(0u32, 100).unwrap().with_target(50);
        assert_eq!(generator.shrink(&90).next(), Some(50));
        let clamped = ints(0u32, 100).unwrap().with_target(500);
        assert_eq!(clamped.shrink(&90).next(), Some(100));
    }

    #[test]
    fn test_full_range_signed_reaches_minimum() {
        let generator = any_int::<i8>();
        let mut seen_min = false;
        let mut ledger = ledger(2);
        for _ in 0..5000 {
            if generator.produce(&mut ledger).unwrap() == i8::MIN {
                seen_min = true;
                break;
            }
        }
        assert!(seen_min);
        assert_eq!(ChoiceLedger::replay(vec![0x80], 4).choice(u64::from(u8::MAX)).unwrap(), 0x80);
        assert_eq!(
            generator.produce(&mut ChoiceLedger::replay(vec![0x80], 4)).unwrap(),
            i8::MIN
        );
    }

    #[test]
    fn test_bools_shrink() {
        let generator = bools();
        assert_eq!(generator.shrink(&true).collect::<Vec<_>>(), vec![false]);
        let mut ledger = ChoiceLedger::replay(vec![1, 0], 4);
        assert!(generator.produce(&mut ledger).unwrap());
        assert!(!generator.produce(&mut ledger).unwrap());
    }

    #[test]
    fn test_wide_floats_cover_magnitudes() {
        let generator = floats();
        let mut ledger = ledger(3);
        let mut small = false;
        let mut large = false;
        let mut negative = false;
        for _ in 0..500 {
            let value = generator.produce(&mut ledger).unwrap();
            assert!(value.is_finite());
            small |= value != 0.0 && value.abs() < 1e-5;
            large |= value.abs() > 1e5;
            negative |= value < 0.0;
        }
        assert!(small && large && negative);
    }

    #[test]
    fn test_float_range_bounds() {
        let generator = float_range(-2.5f64, 7.25).unwrap();
        let mut ledger = ledger(4);
        for _ in 0..200 {
            let value = generator.produce(&mut ledger).unwrap();
            assert!((-2.5..=7.25).contains(&value));
        }
        let extreme = float_range(f32::MIN, f32::MAX).unwrap();
        for _ in 0..50 {
            assert!(extreme.produce(&mut ledger).unwrap().is_finite());
        }
    }

    #[test]
    fn test_float_range_validation() {
        assert!(float_range(1.0f64, 0.0).is_err());
        assert!(float_range(f64::NAN, 1.0).is_err());
        assert!(float_range(0.0f32, f32::INFINITY).is_err());
    }

    #[test]
    fn test_float_range_shrinks_towards_clamped_zero() {
        let generator = float_range(2.0f64, 10.0).unwrap();
        assert_eq!(generator.shrink(&6.0).next(), Some(2.0));
    }

    #[test]
    fn test_chars_from_charset() {
        let generator = chars_from(DIGITS).unwrap();
        let mut ledger = ledger(5);
        for _ in 0..100 {
            assert!(generator.produce(&mut ledger).unwrap().is_ascii_digit());
        }
        assert_eq!(generator.shrink(&'3').collect::<Vec<_>>(), vec!['0', '1', '2']);
        assert!(matches!(chars_from(""), Err(GenError::InvalidChoice(_))));
    }

    #[test]
    fn test_ascii_printable_table() {
        assert_eq!(ASCII_PRINTABLE.len(), 95);
        assert!(ASCII_PRINTABLE.chars().all(|c| (' '..='~').contains(&c)));
        assert_eq!(ALPHANUMERIC.len(), 62);
    }

    #[test]
    fn test_strings_length_and_charset() {
        let generator = strings_from(ALPHA_LOWER, 2, 6).unwrap();
        let mut ledger = ledger(6);
        for _ in 0..100 {
            let value = generator.produce(&mut ledger).unwrap();
            assert!((2..=6).contains(&value.chars().count()));
            assert!(value.chars().all(|c| c.is_ascii_lowercase()));
        }
    }

    #[test]
    fn test_string_shrink_respects_min_len() {
        let generator = alphanumeric_strings(1, 10).unwrap();
        let candidates: Vec<String> = generator.shrink(&"abc".to_string()).collect();
        assert_eq!(candidates[0], "a");
        assert!(candidates.iter().all(|c| !c.is_empty()));
        assert!(candidates.contains(&"aac".to_string()));
    }

    #[test]
    fn test_vecs_length() {
        let generator = vecs(ints(0u8, 3).unwrap(), 1, 4).unwrap();
        let mut ledger = ledger(7);
        for _ in 0..100 {
            let value = generator.produce(&mut ledger).unwrap();
            assert!((1..=4).contains(&value.len()));
            assert!(value.iter().all(|v| *v <= 3));
        }
        assert!(vecs(bools(), 3, 2).is_err());
    }

    #[test]
    fn test_vec_shrink_removes_then_simplifies() {
        let generator = vecs(ints(0u8, 9).unwrap(), 0, 10).unwrap();
        let candidates: Vec<Vec<u8>> = generator.shrink(&vec![4, 2]).collect();
        assert_eq!(candidates[0], Vec::<u8>::new());
        assert!(candidates.contains(&vec![0, 2]));
        assert!(candidates.contains(&vec![4, 0]));
        assert_eq!(generator.shrink(&vec![]).count(), 0);
    }

    #[test]
    fn test_arrays() {
        let generator = arrays::<3, _>(ints(1u16, 6).unwrap());
        let mut ledger = ledger(8);
        let value = generator.produce(&mut ledger).unwrap();
        assert!(value.iter().all(|v| (1..=6).contains(v)));
        assert_eq!(ledger.choices().len(), 3);

        let candidates: Vec<[u16; 3]> = generator.shrink(&[1, 3, 1]).collect();
        assert_eq!(candidates, vec![[1, 1, 1], [1, 2, 1]]);
    }

    #[test]
    fn test_hash_maps() {
        let generator = hash_maps(ints(0u8, 3).unwrap(), bools(), 0, 10).unwrap();
        let mut ledger = ledger(9);
        for _ in 0..50 {
            let map = generator.produce(&mut ledger).unwrap();
            assert!(map.len() <= 4);
        }
        let value: HashMap<u8, bool> = [(1, true), (2, false)].into_iter().collect();
        let candidates: Vec<HashMap<u8, bool>> = generator.shrink(&value).collect();
        assert!(candidates[0].is_empty());
        assert!(candidates.iter().any(|c| c.len() == 2 && c.get(&1) == Some(&false)));
    }

    #[test]
    fn test_options() {
        let generator = options(ints(0i32, 10).unwrap());
        let mut ledger = ChoiceLedger::replay(vec![0, 1, 7], 8);
        assert_eq!(generator.produce(&mut ledger).unwrap(), None);
        assert_eq!(generator.produce(&mut ledger).unwrap(), Some(7));

        let candidates: Vec<Option<i32>> = generator.shrink(&Some(2)).collect();
        assert_eq!(candidates, vec![None, Some(0), Some(1)]);
        assert_eq!(generator.shrink(&None).count(), 0);
    }

    #[test]
    fn test_element_of() {
        let generator = element_of(vec!["red", "green", "blue"]);
        let mut ledger = ledger(10);
        for _ in 0..30 {
            let value = generator.produce(&mut ledger).unwrap();
            assert!(["red", "green", "blue"].contains(&value));
        }
        assert_eq!(generator.shrink(&"blue").collect::<Vec<_>>(), vec!["red", "green"]);

        let empty = element_of(Vec::<u8>::new());
        assert!(matches!(empty.produce(&mut ledger), Err(GenError::InvalidChoice(_))));
    }

    #[test]
    fn test_uuid_format() {
        let generator = uuids();
        let mut ledger = ledger(11);
        let value = generator.produce(&mut ledger).unwrap();
        let groups: Vec<&str> = value.split('-').collect();
        assert_eq!(
            groups.iter().map(|g| g.len()).collect::<Vec<_>>(),
            vec![8, 4, 4, 4, 12]
        );
        assert!(groups[2].starts_with('4'));
        assert!(matches!(groups[3].chars().next(), Some('8' | '9' | 'a' | 'b')));
        assert_eq!(
            format_uuid(0, 0),
            "00000000-0000-4000-8000-000000000000"
        );
    }

    #[test]
    fn test_long_vec_hits_choice_budget() {
        let generator = vecs(bools(), 0, 5000).unwrap();
        let mut ledger = ChoiceLedger::replay(vec![100], 16);
        assert_eq!(
            generator.produce(&mut ledger),
            Err(GenError::choice_overrun(16))
        );
    }

    #[test]
    fn test_huge_collections_overrun_instead_of_allocating() {
        let huge = usize::MAX / 4;
        let overrun = GenError::choice_overrun(DEFAULT_MAX_CHOICES);

        for seed in 0..5 {
            let generator = vecs(ints(0u64, 9).unwrap(), huge, huge).unwrap();
            assert_eq!(generator.produce(&mut ledger(seed)).err(), Some(overrun.clone()));

            let generator = alphanumeric_strings(huge, huge).unwrap();
            assert_eq!(generator.produce(&mut ledger(seed)).err(), Some(overrun.clone()));

            let generator = hash_maps(ints(0u32, 9).unwrap(), bools(), huge, huge).unwrap();
            assert_eq!(generator.produce(&mut ledger(seed)).err(), Some(overrun.clone()));
        }
    }

    #[test]
    fn test_huge_max_len_draws_until_budget() {
        // a drawn length near the top of the range still ends in an overrun
        let huge = usize::MAX / 4;
        let generator = vecs(bools(), 0, huge).unwrap();
        let mut ledger = ChoiceLedger::replay(vec![huge as u64], DEFAULT_MAX_CHOICES);
        assert_eq!(
            generator.produce(&mut ledger),
            Err(GenError::choice_overrun(DEFAULT_MAX_CHOICES))
        );
        assert_eq!(ledger.choices().len(), DEFAULT_MAX_CHOICES);
    }
}
