//! Transport error types.

use crate::xml::XmlError;

/// Errors that can occur when requesting a document from the API.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The request never produced a response (connection, timeout, bad URL)
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The API answered with a status other than 200
    #[error("API error {status}: {body}")]
    Status { status: u16, body: String },

    /// The response body is not a usable XML document
    #[error("invalid XML response: {0}")]
    Xml(#[from] XmlError),

    /// No tokio runtime is available to drive the request
    #[error("no tokio runtime available to issue the request")]
    NoRuntime,
}

impl TransportError {
    /// HTTP status of the failed response, if the API answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            TransportError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}
