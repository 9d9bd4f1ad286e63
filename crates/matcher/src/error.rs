use std::fmt;
use std::path::PathBuf;

#[derive(Debug)]
pub enum MatchError {
    /// File could not be read (records, catalog, prior output, checkpoint).
    Read { path: PathBuf, message: String },
    /// File was read but is not the expected JSON shape.
    Parse { path: PathBuf, message: String },
    /// Output, report or checkpoint could not be written.
    Write { path: PathBuf, message: String },
    /// Serialization of in-memory state failed.
    Encode(String),
}

impl MatchError {
    pub(crate) fn read(path: impl Into<PathBuf>, err: impl fmt::Display) -> Self {
        Self::Read { path: path.into(), message: err.to_string() }
    }

    pub(crate) fn parse(path: impl Into<PathBuf>, err: impl fmt::Display) -> Self {
        Self::Parse { path: path.into(), message: err.to_string() }
    }

    pub(crate) fn write(path: impl Into<PathBuf>, err: impl fmt::Display) -> Self {
        Self::Write { path: path.into(), message: err.to_string() }
    }
}

impl fmt::Display for MatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Read { path, message } => {
                write!(f, "cannot read {}: {message}", path.display())
            }
            Self::Parse { path, message } => {
                write!(f, "invalid JSON in {}: {message}", path.display())
            }
            Self::Write { path, message } => {
                write!(f, "cannot write {}: {message}", path.display())
            }
            Self::Encode(msg) => write!(f, "JSON serialization error: {msg}"),
        }
    }
}

impl std::error::Error for MatchError {}
