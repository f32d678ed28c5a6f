use std::{fmt, path::PathBuf};

/// Result alias that carries the custom [`PathMusicError`] type.
pub type Result<T> = std::result::Result<T, PathMusicError>;

/// Kind of entity a mutation tried to address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Track,
    Node,
    Event,
    Router,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Track => "track",
            Self::Node => "node",
            Self::Event => "event",
            Self::Router => "router",
        };
        f.write_str(name)
    }
}

/// Common error type for the core crate.
#[derive(Debug, thiserror::Error)]
pub enum PathMusicError {
    /// Fatal codec failure. `line` is 1-based and `text` is the raw source
    /// line so an editor can point at it.
    #[error("line {line}: {message}: {text}")]
    Parse {
        line: usize,
        text: String,
        message: String,
    },
    /// A mutation addressed an id the model does not hold.
    #[error("{kind} {id} not found")]
    NotFound { kind: EntityKind, id: String },
    /// `add_event` was handed an event whose numeric id is already taken.
    #[error("event id {id} already exists")]
    DuplicateEvent { id: i64 },
    /// An event handed to the store that its own dump could not read back.
    #[error("event {id} is invalid: {message}")]
    InvalidEvent { id: i64, message: String },
    #[error("{0}")]
    Message(String),
    /// IO failure on a named file.
    #[error("{}: {source}", path.display())]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// Wrapper around standard IO errors.
    #[error("{0}")]
    Io(#[from] std::io::Error),
    #[error("{0}")]
    Json(#[from] serde_json::Error),
}

impl PathMusicError {
    /// Creates a new error that simply wraps the provided message.
    pub fn msg<T: Into<String>>(msg: T) -> Self {
        Self::Message(msg.into())
    }

    pub fn parse(line: usize, text: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Parse {
            line,
            text: text.into(),
            message: message.into(),
        }
    }

    pub fn not_found(kind: EntityKind, id: impl fmt::Display) -> Self {
        Self::NotFound {
            kind,
            id: id.to_string(),
        }
    }

    pub fn file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::File {
            path: path.into(),
            source,
        }
    }

    /// Line number of a parse failure, if this is one.
    pub fn line(&self) -> Option<usize> {
        match self {
            Self::Parse { line, .. } => Some(*line),
            _ => None,
        }
    }
}

impl From<&str> for PathMusicError {
    fn from(value: &str) -> Self {
        Self::msg(value)
    }
}

impl From<String> for PathMusicError {
    fn from(value: String) -> Self {
        Self::Message(value)
    }
}
