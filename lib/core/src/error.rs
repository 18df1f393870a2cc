use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Persona not found: {0}")]
    PersonaNotFound(String),

    #[error("Session not found: {0}")]
    SessionNotFound(String),

    #[error("Persona must be selected before recommending")]
    PersonaNotSet,

    #[error("Session already finished: every category has a selection")]
    SessionFinished,

    #[error("Unknown category: {0}")]
    UnknownCategory(String),

    #[error("Invalid vector dimension: expected {expected}, got {actual}")]
    InvalidDimension { expected: usize, actual: usize },

    #[error("Index mismatch: {0}")]
    IndexMismatch(String),

    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Embedding failed: {0}")]
    Embedding(String),

    #[error("{collaborator} failed: {message}")]
    Collaborator {
        collaborator: &'static str,
        message: String,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Coarse error classes, used by the API layer to pick a status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Precondition,
    StorageUnavailable,
    Collaborator,
    InvalidInput,
    Internal,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::PersonaNotFound(_) | Error::SessionNotFound(_) => ErrorKind::NotFound,
            Error::PersonaNotSet | Error::SessionFinished => ErrorKind::Precondition,
            Error::StorageUnavailable(_) => ErrorKind::StorageUnavailable,
            Error::Embedding(_) | Error::Collaborator { .. } => ErrorKind::Collaborator,
            Error::UnknownCategory(_) => ErrorKind::InvalidInput,
            Error::InvalidDimension { .. }
            | Error::IndexMismatch(_)
            | Error::Storage(_)
            | Error::Io(_)
            | Error::Serialization(_)
            | Error::InvalidConfig(_) => ErrorKind::Internal,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}
