//! Client construction errors.

/// Errors that can occur when creating a [`Vlille`](crate::Vlille) client.
#[derive(Debug, thiserror::Error)]
pub enum VlilleError {
    /// No API proxy URL was configured
    #[error("you have to provide an API proxy URL")]
    MissingProxyUrl,

    /// The HTTP client could not be built
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),
}
