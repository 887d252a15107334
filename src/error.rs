/// Convenience result type used across the engine.
pub type BoothResult<T> = Result<T, BoothError>;

/// Top-level error taxonomy.
///
/// Every failure in this crate is recoverable: camera problems are surfaced
/// as user-facing messages, unsupported encoders degrade to photo-only
/// operation, and cosmetic asset failures are skipped at the call site.
/// There is deliberately no fatal variant.
#[derive(thiserror::Error, Debug)]
pub enum BoothError {
    /// Invalid structural configuration (layouts, dimensions, colors).
    #[error("validation error: {0}")]
    Validation(String),

    /// Camera acquisition or frame access problems.
    #[error("camera error: {0}")]
    Camera(String),

    /// Encoding, decoding, or probing of media streams.
    #[error("media error: {0}")]
    Media(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl BoothError {
    /// Build a [`BoothError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`BoothError::Camera`] value.
    pub fn camera(msg: impl Into<String>) -> Self {
        Self::Camera(msg.into())
    }

    /// Build a [`BoothError::Media`] value.
    pub fn media(msg: impl Into<String>) -> Self {
        Self::Media(msg.into())
    }
}
