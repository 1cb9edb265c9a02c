use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced by catalog operations.
///
/// Bulk operations (`check_all`, `reindex_all`) never fail because one share
/// is broken; they record the error string per share instead. Single-entity
/// operations surface the first error encountered.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Share creation was pointed at something that is not a directory
    #[error("not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    /// Unknown share or file identifier
    #[error("not found")]
    NotFound,

    /// A share's root folder no longer exists on disk
    #[error("share root no longer exists: {}", .0.display())]
    PathGone(PathBuf),

    /// A directory could not be listed
    #[error("permission denied: {}", .0.display())]
    PermissionDenied(PathBuf),

    /// No serving handler exists for this media class
    #[error("no serving handler for media class")]
    UnknownMediaType,

    #[error("directory walk failed: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("database error: {0}")]
    Db(#[from] rusqlite::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, CatalogError>;
