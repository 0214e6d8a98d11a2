//! Default generators for common types.

use crate::generator::Generator;
use crate::primitives::{
    BoolGenerator, CharGenerator, FloatGenerator, IntGenerator, OptionGenerator, StringGenerator,
    VecGenerator, any_int, bools, floats, floats32, options,
};

/// Longest string produced by the default `String` generator
pub const DEFAULT_STRING_LEN: usize = 32;
/// Longest vector produced by the default `Vec` generator
pub const DEFAULT_VEC_LEN: usize = 16;

/// Types with a default generator.
///
/// `#[derive(Record)]` uses this for every field without an explicit generator.
pub trait Arbitrary: Sized {
    /// The generator producing values of this type
    type Generator: Generator<Value = Self>;

    /// Create the default generator
    fn arbitrary() -> Self::Generator;
}

impl Arbitrary for bool {
    type Generator = BoolGenerator;

    fn arbitrary() -> Self::Generator {
        bools()
    }
}

macro_rules! impl_arbitrary_int {
    ($($t:ty),*) => {
        $(
            impl Arbitrary for $t {
                type Generator = IntGenerator<$t>;

                fn arbitrary() -> Self::Generator {
                    any_int::<$t>()
                }
            }
        )*
    };
}

impl_arbitrary_int!(u8, u16, u32, u64, usize, i8, i16, i32, i64, isize);

impl Arbitrary for f64 {
    type Generator = FloatGenerator<f64>;

    fn arbitrary() -> Self::Generator {
        floats()
    }
}

impl Arbitrary for f32 {
    type Generator = FloatGenerator<f32>;

    fn arbitrary() -> Self::Generator {
        floats32()
    }
}

/// Printable ASCII characters
impl Arbitrary for char {
    type Generator = CharGenerator;

    fn arbitrary() -> Self::Generator {
        CharGenerator::printable()
    }
}

/// Printable ASCII strings of up to [`DEFAULT_STRING_LEN`] characters
impl Arbitrary for String {
    type Generator = StringGenerator;

    fn arbitrary() -> Self::Generator {
        StringGenerator::printable(DEFAULT_STRING_LEN)
    }
}

impl<T> Arbitrary for Vec<T>
where
    T: Arbitrary + Clone + 'static,
{
    type Generator = VecGenerator<T::Generator>;

    fn arbitrary() -> Self::Generator {
        VecGenerator::up_to(T::arbitrary(), DEFAULT_VEC_LEN)
    }
}

impl<T> Arbitrary for Option<T>
where
    T: Arbitrary + 'static,
{
    type Generator = OptionGenerator<T::Generator>;

    fn arbitrary() -> Self::Generator {
        options(T::arbitrary())
    }
}
