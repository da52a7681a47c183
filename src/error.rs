//! Error taxonomy for the device core.
//!
//! Only failures that callers act on are modelled here. Cursor moves past the
//! end of a listing are clamped silently and end of stream drives the
//! auto-advance, so neither has a variant.

use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage unavailable at '{path}': {source}")]
    Unavailable {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("'{0}' is not a directory")]
    NotADirectory(String),
}

impl StorageError {
    pub fn unavailable(path: impl Into<String>, source: io::Error) -> Self {
        StorageError::Unavailable {
            path: path.into(),
            source,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ListingError {
    #[error("cursor {cursor} is out of range for a listing of {len} entries")]
    OutOfRange { cursor: usize, len: usize },
}

#[derive(Debug, Error)]
pub enum PlaybackError {
    #[error("could not open '{path}'")]
    OpenFailed {
        path: String,
        #[source]
        source: StorageError,
    },
    #[error("could not skip the stream header of '{path}': {source}")]
    Header {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("audio sink failed: {0}")]
    Sink(#[source] io::Error),
}

/// Why a configuration request line was ignored
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigRequestError {
    #[error("request line is too short ({0} characters)")]
    TooShort(usize),
    #[error("request line is not a GET ... HTTP/1.1 request")]
    NotGetRequest,
    #[error("request carries no query string")]
    MissingQuery,
    #[error("field '{0}' is missing")]
    MissingField(String),
    #[error("field '{field}' has invalid value '{value}'")]
    InvalidValue { field: String, value: String },
}

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("persistent store I/O failed: {0}")]
    Io(#[from] io::Error),
    #[error("persistent store address {0} is out of range")]
    Address(usize),
}
