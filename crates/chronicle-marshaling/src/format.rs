//! Payload formats and the encode/decode entry points.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

/// Errors raised while encoding or decoding a payload.
#[derive(Debug, Error)]
pub enum MarshalError {
    /// JSON encoding or decoding failed.
    #[error("json: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML encoding or decoding failed.
    #[error("yaml: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// The format name is not recognised.
    #[error("unknown payload format: {0:?}")]
    UnknownFormat(String),
}

/// A payload encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Format {
    /// JSON (`application/json`).
    #[default]
    Json,
    /// YAML (`application/yaml`).
    Yaml,
}

impl Format {
    /// Returns the MIME type for this format.
    #[must_use]
    pub fn content_type(self) -> &'static str {
        match self {
            Self::Json => "application/json",
            Self::Yaml => "application/yaml",
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Json => f.write_str("json"),
            Self::Yaml => f.write_str("yaml"),
        }
    }
}

impl FromStr for Format {
    type Err = MarshalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" | "application/json" => Ok(Self::Json),
            "yaml" | "yml" | "application/yaml" => Ok(Self::Yaml),
            other => Err(MarshalError::UnknownFormat(other.to_owned())),
        }
    }
}

/// Encodes `value` into a byte payload.
///
/// # Errors
///
/// Returns `MarshalError` if the value cannot be represented in `format`.
pub fn encode<T>(format: Format, value: &T) -> Result<Vec<u8>, MarshalError>
where
    T: Serialize + ?Sized,
{
    match format {
        Format::Json => Ok(serde_json::to_vec(value)?),
        Format::Yaml => Ok(serde_yaml::to_string(value)?.into_bytes()),
    }
}

/// Decodes a byte payload into a `T`.
///
/// # Errors
///
/// Returns `MarshalError` if the bytes are malformed for `format` or do not
/// match the shape of `T`.
pub fn decode<T>(format: Format, bytes: &[u8]) -> Result<T, MarshalError>
where
    T: DeserializeOwned,
{
    match format {
        Format::Json => Ok(serde_json::from_slice(bytes)?),
        Format::Yaml => Ok(serde_yaml::from_slice(bytes)?),
    }
}
