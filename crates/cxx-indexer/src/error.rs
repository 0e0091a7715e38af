use std::path::PathBuf;

use thiserror::Error;

/// Everything that can go wrong while indexing or answering a query.
///
/// Query entry points never surface these to callers; they log and degrade
/// to empty results. The variants exist so the worker and the persistence
/// layer can report precisely what failed.
#[derive(Debug, Error)]
pub enum IndexError {
    #[error("no document indexed for {}", .0.display())]
    NotIndexed(PathBuf),

    #[error("could not resolve a symbol at {0}")]
    UnresolvedSymbol(String),

    #[error("{}:{line}:{column}: {message}", path.display())]
    ParseDiagnostic {
        path: PathBuf,
        line: u32,
        column: u32,
        message: String,
    },

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{} is {size} bytes, above the configured limit", path.display())]
    TooLarge {
        path: PathBuf,
        size: u64,
    },

    #[error("invalid project state: {0}")]
    Persist(#[from] serde_json::Error),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("invalid location `{0}`, expected path:line:column")]
    InvalidLocation(String),
}

pub type Result<T> = std::result::Result<T, IndexError>;
