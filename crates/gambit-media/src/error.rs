//! Error types for the media service layer.

/// Errors from the external media vendor.
#[derive(Debug, thiserror::Error)]
pub enum MediaError {
    /// The request itself failed: connect error, timeout, TLS, etc.
    /// A bounded client timeout converts a hung vendor into this variant
    /// instead of stalling the calling room indefinitely.
    #[error("media request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The vendor answered with a non-success status.
    #[error("media service returned {status}: {message}")]
    Api { status: u16, message: String },

    /// The vendor answered 2xx but the body didn't have the expected shape.
    #[error("malformed media response: {0}")]
    Malformed(String),
}
