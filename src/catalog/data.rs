/// Shared data structures for the catalog
///
/// These structs represent the rows that flow between the database layer
/// and the boundary layer.
use serde::Serialize;
use std::path::Path;

use crate::ident::Ident;
use crate::media::{classify_path, MediaClass};

/// A cataloged root folder exposed for viewing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Share {
    /// Identifier of the root path
    pub id: Ident,
    /// Absolute filesystem path of the root folder at creation time
    pub path: String,
    /// Unix timestamp of the creation
    pub created_at: i64,
}

/// A cataloged file under a share.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileEntry {
    /// The share this file belongs to
    pub share_id: Ident,
    /// Identifier of the file's absolute path
    pub file_id: Ident,
    /// Absolute filesystem path at indexing time (never re-derived from the id)
    pub path: String,
    /// Serving class derived from the file extension
    pub media_class: MediaClass,
}

impl FileEntry {
    /// Build the catalog entry for a file on disk: identity from the path
    /// string, class from the extension. Does not touch the filesystem.
    pub fn for_path(share_id: &Ident, path: &Path) -> FileEntry {
        let path_str = path.to_string_lossy().to_string();
        FileEntry {
            share_id: share_id.clone(),
            file_id: Ident::of_path(&path_str),
            media_class: classify_path(path),
            path: path_str,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_for_path() {
        let share = Ident::of_path("/srv/media");
        let entry = FileEntry::for_path(&share, Path::new("/srv/media/a.jpg"));

        assert_eq!(entry.share_id, share);
        assert_eq!(entry.file_id, Ident::of_path("/srv/media/a.jpg"));
        assert_eq!(entry.path, "/srv/media/a.jpg");
        assert_eq!(entry.media_class, MediaClass::Image);
    }
}
