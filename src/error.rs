use thiserror::Error;

/// Top-level error type for the Lithos model engine.
#[derive(Debug, Error)]
pub enum LithosError {
    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    Codec(#[from] CodecError),
}

/// Errors raised by mutations of a structural model.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("entity not found: {0}")]
    EntityNotFound(String),

    #[error("collection not found: {0}")]
    CollectionNotFound(String),

    #[error("entity {inner} is already internal to {existing}, cannot host it in {requested}")]
    InternalConflict {
        inner: String,
        existing: String,
        requested: String,
    },

    #[error("entity {inner} cannot be internal to itself or to one of its own internals")]
    InternalCycle { inner: String },

    #[error("model integrity violated: {0}")]
    Corrupted(String),
}

/// Errors raised while reading or writing an on-disk format.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("unresolved reference to {reference} at line {line}")]
    Reference { line: usize, reference: String },

    #[error("unsupported {format} revision {found} (supported: {supported})")]
    Version {
        format: &'static str,
        found: String,
        supported: &'static str,
    },

    #[error("no codec registered for \"{0}\" files")]
    UnknownFormat(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Model(#[from] ModelError),
}

impl CodecError {
    /// Shorthand for a [`CodecError::Parse`] with a formatted message.
    pub(crate) fn parse(line: usize, message: impl Into<String>) -> Self {
        Self::Parse {
            line,
            message: message.into(),
        }
    }
}

/// Convenience type alias for results using [`LithosError`].
pub type Result<T> = std::result::Result<T, LithosError>;
