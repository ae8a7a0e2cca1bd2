use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Io,
    InvalidQuery,
    MirrorUnavailable,
    Cancelled,
    NotFound,
    Internal,
}

#[derive(Debug)]
pub struct Error {
    pub kind: ErrorKind,
    pub context: String,
}

impl Error {
    pub fn new(kind: ErrorKind, context: String) -> Self {
        Error { kind, context }
    }

    pub fn cancelled() -> Self {
        Error {
            kind: ErrorKind::Cancelled,
            context: "query cancelled".to_string(),
        }
    }

    pub fn invalid_query(context: impl Into<String>) -> Self {
        Error {
            kind: ErrorKind::InvalidQuery,
            context: context.into(),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.context)
    }
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error {
            kind: ErrorKind::Io,
            context: err.to_string(),
        }
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error {
            kind: ErrorKind::MirrorUnavailable,
            context: format!("mirror error: {}", err),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
