//! Format-agnostic marshaling adapters.
//!
//! A type implements [`Marshal`] once, returning a serializable
//! representation of itself, and [`Marshaled`] turns that into a `Serialize`
//! impl that behaves identically for JSON and YAML. [`Unmarshal`] and
//! [`Unmarshaled`] mirror this for decoding.

use std::fmt;

use serde::de::{self, DeserializeOwned};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Produces the wire representation of a value.
pub trait Marshal {
    /// The serializable representation.
    type Repr: Serialize;

    /// Builds the representation that is written for this value.
    fn marshal(&self) -> Self::Repr;
}

/// Rebuilds a value from its wire representation.
pub trait Unmarshal: Sized {
    /// The deserializable representation.
    type Repr: DeserializeOwned;
    /// Error raised when the representation is well-formed but invalid.
    type Error: fmt::Display;

    /// Converts a decoded representation into the value.
    ///
    /// # Errors
    ///
    /// Returns `Self::Error` when the representation violates the type's
    /// invariants.
    fn unmarshal(repr: Self::Repr) -> Result<Self, Self::Error>;
}

/// Borrowing `Serialize` wrapper around a [`Marshal`] value.
#[derive(Debug, Clone, Copy)]
pub struct Marshaled<'a, M: ?Sized>(pub &'a M);

impl<M> Serialize for Marshaled<'_, M>
where
    M: Marshal + ?Sized,
{
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.0.marshal().serialize(serializer)
    }
}

/// Owning `Deserialize` wrapper around an [`Unmarshal`] value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unmarshaled<U>(pub U);

impl<U> Unmarshaled<U> {
    /// Unwraps the decoded value.
    pub fn into_inner(self) -> U {
        self.0
    }
}

impl<'de, U> Deserialize<'de> for Unmarshaled<U>
where
    U: Unmarshal,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let repr = U::Repr::deserialize(deserializer)?;
        U::unmarshal(repr).map(Unmarshaled).map_err(de::Error::custom)
    }
}
