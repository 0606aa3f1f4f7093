use thiserror::Error;

#[derive(Error, Debug)]
pub enum DeckError {
    #[error("Backend error: {0}")]
    Backend(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Missing container: {0}")]
    MissingContainer(String),

    #[error("Stale reference: {0}")]
    StaleReference(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl DeckError {
    /// Stale-reference and missing-endpoint conditions are expected under
    /// fast interleaved UI actions and are swallowed rather than surfaced.
    pub fn is_stale(&self) -> bool {
        matches!(self, DeckError::StaleReference(_))
    }
}
