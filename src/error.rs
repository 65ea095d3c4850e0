use std::path::PathBuf;

/// Failures while loading inputs. Extraction itself never fails: a heuristic
/// that does not match just yields nothing.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid glob pattern: {0}")]
    Glob(#[from] glob::PatternError),
    #[error("failed to walk docs tree: {0}")]
    GlobWalk(#[from] glob::GlobError),
    #[error("invalid config {path}: {message}")]
    Config { path: PathBuf, message: String },
    #[error("invalid partition pattern `{pattern}`: {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
    #[error("rename `{from}` -> `{to}` is not idempotent: `{to}` is itself renamed to `{next}`")]
    NonIdempotentRename { from: String, to: String, next: String },
}

pub type Result<T> = std::result::Result<T, Error>;
