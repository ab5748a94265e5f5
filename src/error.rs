//! Error types shared by the session layer and the service adapters

use aws_sdk_s3::error::DisplayErrorContext;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors returned by every public operation of the crate
#[derive(Error, Debug)]
pub enum Error {
    /// Missing or invalid region, or no usable credential source
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Malformed local input (bad base64, unreadable file, empty bucket name, ...)
    #[error("validation error: {0}")]
    Validation(String),

    /// Failure surfaced by a remote AWS call, not interpreted further
    #[error("{context}: {detail}")]
    RemoteService {
        context: String,
        detail: String,
        #[source]
        source: BoxError,
    },
}

impl Error {
    pub(crate) fn configuration(message: impl Into<String>) -> Self {
        Error::Configuration(message.into())
    }

    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Error::Validation(message.into())
    }

    /// Wrap an SDK error with the operation that produced it.
    ///
    /// The full error chain is rendered once into `detail` so that the
    /// service error code survives a plain `to_string()`.
    pub fn remote<E>(context: impl Into<String>, err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        let detail = DisplayErrorContext(&err).to_string();
        Error::RemoteService {
            context: context.into(),
            detail,
            source: Box::new(err),
        }
    }

    pub fn is_configuration(&self) -> bool {
        matches!(self, Error::Configuration(_))
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Error::Validation(_))
    }

    pub fn is_remote(&self) -> bool {
        matches!(self, Error::RemoteService { .. })
    }
}
