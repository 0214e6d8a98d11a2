//! Derive macros for the chancery property testing engine
//!
//! This crate provides `#[derive(Record)]`, which builds a generator for a
//! struct out of one generator per field.

use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

mod record;

/// Derive a record generator for a struct.
///
/// Every field is drawn independently, in declaration order. Fields are not
/// correlated; use `chancery::dependent` when one field must be computed from
/// another.
///
/// # Basic Usage
///
/// ```rust
/// use chancery::{Generator, Record};
///
/// #[derive(Debug, Clone, Record)]
/// struct User {
///     id: u32,
///     name: String,
///     active: bool,
/// }
///
/// let generator = User::record_generator().unwrap();
/// ```
///
/// # Field Generators
///
/// ```rust
/// use chancery::{Record, alphanumeric_strings, bools, ints};
///
/// #[derive(Debug, Clone, Record)]
/// struct Account {
///     #[record(try_with = "ints(1u32, 1000)")]
///     id: u32,
///     #[record(try_with = "alphanumeric_strings(1, 12)")]
///     handle: String,
///     #[record(with = "bools()")]
///     verified: bool,
/// }
/// ```
///
/// # Supported Attributes
///
/// - `with = "expr"`: a generator expression for the field
/// - `try_with = "expr"`: an expression returning `Result<generator, GenError>`
///
/// Fields without an attribute use the type's `Arbitrary` generator.
///
/// # Generated Items
///
/// For a struct `Name` the macro emits a `NameRecord` generator type and an
/// associated `Name::record_generator()` returning
/// `Result<NameRecord, GenError>`. When no field uses `try_with`, `Name` also
/// implements `Arbitrary`, so records nest inside other records and collections.
///
/// Shrinking replaces one field at a time, left to right, so the struct must
/// be `Clone`. Enums, unions and generic structs are rejected.
#[proc_macro_derive(Record, attributes(record))]
pub fn derive_record(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    match record::expand(&input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}
