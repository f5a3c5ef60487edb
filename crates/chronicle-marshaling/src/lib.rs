//! Chronicle Marshaling: byte payload encoding for event data.
//!
//! Event payloads are opaque bytes to the core. This crate converts in-memory
//! values to and from those bytes in either JSON or YAML, and provides the
//! [`Marshal`] / [`Unmarshal`] adapters that give a type one representation
//! shared by both formats.

mod adapter;
mod format;

pub use adapter::{Marshal, Marshaled, Unmarshal, Unmarshaled};
pub use format::{Format, MarshalError, decode, encode};
