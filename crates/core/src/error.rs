/// Result alias that carries the custom [`BeatlightError`] type.
pub type Result<T> = std::result::Result<T, BeatlightError>;

/// Common error type for the core crate.
#[derive(Debug, thiserror::Error)]
pub enum BeatlightError {
    /// Free-form failure surfaced by a collaborator, such as a poisoned store.
    #[error("{0}")]
    Message(String),
    /// Wrapper around standard IO errors.
    #[error("{0}")]
    Io(#[from] std::io::Error),
    /// Malformed configuration or scene file.
    #[error("invalid json: {0}")]
    Json(#[from] serde_json::Error),
    /// A split index was requested that the scene does not declare.
    #[error("split index {index} is out of range for a scene with {count} splits")]
    SplitOutOfRange { index: usize, count: usize },
    /// A modulator was built for fewer splits than its scene declares.
    #[error("modulator has {len} split modulations but split {index} was requested")]
    ModulatorSplitMismatch { index: usize, len: usize },
}

impl BeatlightError {
    /// Creates a new error that simply wraps the provided message.
    pub fn msg<T: Into<String>>(msg: T) -> Self {
        Self::Message(msg.into())
    }
}

impl From<&str> for BeatlightError {
    fn from(value: &str) -> Self {
        Self::msg(value)
    }
}

impl From<String> for BeatlightError {
    fn from(value: String) -> Self {
        Self::Message(value)
    }
}
