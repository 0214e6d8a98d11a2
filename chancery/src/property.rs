//! Property definitions.

use thiserror::Error;

/// A predicate over generated inputs.
///
/// The engine only distinguishes pass from fail; the error value is opaque
/// to it and is handed back to the caller unchanged.
pub trait Property<T: ?Sized> {
    /// The property's own failure type
    type Error;

    /// Test the property with the given input
    fn test(&self, input: &T) -> Result<(), Self::Error>;
}

impl<T: ?Sized, E, F> Property<T> for F
where
    F: Fn(&T) -> Result<(), E>,
{
    type Error = E;

    fn test(&self, input: &T) -> Result<(), E> {
        self(input)
    }
}

/// Failure of a boolean property
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("property returned false")]
pub struct Falsified;

/// Property built from a boolean predicate by [`holds`]
#[derive(Debug, Clone, Copy)]
pub struct Holds<F> {
    predicate: F,
}

impl<T: ?Sized, F> Property<T> for Holds<F>
where
    F: Fn(&T) -> bool,
{
    type Error = Falsified;

    fn test(&self, input: &T) -> Result<(), Falsified> {
        if (self.predicate)(input) {
            Ok(())
        } else {
            Err(Falsified)
        }
    }
}

/// Turn a boolean predicate into a property failing with [`Falsified`]
pub fn holds<F>(predicate: F) -> Holds<F> {
    Holds { predicate }
}
