//! Share management.
//!
//! A share is created from a chosen folder: the folder's path becomes the
//! share identifier, and every regular file found by the walk becomes a file
//! entry. Creation walks the tree *recursively*; reindexing (see the
//! reconcile module) only considers direct children. That asymmetry is
//! inherited from the original system and deliberately kept — both code
//! paths go through [`collect_files`], so the depth each uses is a single
//! argument away from being unified.

use chrono::Utc;
use serde::Serialize;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::info;
use walkdir::WalkDir;

use crate::catalog::{Catalog, FileEntry, Share};
use crate::error::{CatalogError, Result};
use crate::ident::Ident;
use crate::media::MediaClass;

/// How deep a file-collection walk goes. The single knob behind the
/// create/reindex recursion asymmetry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkDepth {
    /// Whole subtree (share creation)
    Recursive,
    /// Direct children of the root only (reindex, drift check)
    DirectChildren,
}

impl WalkDepth {
    fn max_depth(self) -> usize {
        match self {
            WalkDepth::Recursive => usize::MAX,
            WalkDepth::DirectChildren => 1,
        }
    }
}

/// Collect the regular files under `root` at the given depth.
///
/// The first walk error aborts the collection — there is no partial-skip
/// policy here, in contrast to the tree scanner. Errors on the root itself
/// are mapped to the catalog taxonomy (`PathGone` / `PermissionDenied`) so
/// the reconciler can report them per share.
pub fn collect_files(root: &Path, depth: WalkDepth) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for entry in WalkDir::new(root).max_depth(depth.max_depth()) {
        let entry = entry.map_err(|err| walk_error(err, root))?;
        if entry.file_type().is_file() {
            files.push(entry.into_path());
        }
    }

    Ok(files)
}

fn walk_error(err: walkdir::Error, root: &Path) -> CatalogError {
    let on_root = err.path() == Some(root);
    match (on_root, err.io_error().map(|io| io.kind())) {
        (true, Some(ErrorKind::NotFound)) => CatalogError::PathGone(root.to_path_buf()),
        (true, Some(ErrorKind::PermissionDenied)) => {
            CatalogError::PermissionDenied(root.to_path_buf())
        }
        _ => CatalogError::Walk(err),
    }
}

/// Create a share from a folder and populate its file entries from disk.
///
/// Fails with `NotADirectory` if `root` does not resolve to an existing
/// directory. On success the share row is persisted first, then one file
/// entry per regular file found at `depth` (creation passes
/// [`WalkDepth::Recursive`]). Each insert commits on its own, so a failure
/// partway through aborts the operation but leaves the entries inserted so
/// far in place — a subsequent reindex cleans that up.
pub fn create_share(catalog: &Catalog, root: &Path, depth: WalkDepth) -> Result<Share> {
    if !root.is_dir() {
        return Err(CatalogError::NotADirectory(root.to_path_buf()));
    }

    let path_str = root.to_string_lossy().to_string();
    let share = Share {
        id: Ident::of_path(&path_str),
        path: path_str,
        created_at: Utc::now().timestamp(),
    };
    catalog.put_share(&share)?;

    let files = collect_files(root, depth)?;
    for path in &files {
        catalog.put_file(&FileEntry::for_path(&share.id, path))?;
    }

    info!(share = %share.id, path = %share.path, files = files.len(), "share created");

    Ok(share)
}

/// The external view of a cataloged file: identifier and class only. The
/// filesystem path is withheld from untrusted callers.
#[derive(Debug, Clone, Serialize)]
pub struct MediaRef {
    pub id: Ident,
    pub media_class: MediaClass,
}

/// List a share's files for a viewer. An unknown share yields an empty list,
/// mirroring the storage semantics.
pub fn list_media(catalog: &Catalog, share_id: &Ident) -> Result<Vec<MediaRef>> {
    let media = catalog
        .list_files(share_id)?
        .into_iter()
        .map(|entry| MediaRef {
            id: entry.file_id,
            media_class: entry.media_class,
        })
        .collect();
    Ok(media)
}

/// What the byte-serving wrapper needs to hand a file to a viewer.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedFile {
    pub path: String,
    pub media_class: MediaClass,
}

/// Resolve a file identifier to its on-disk path and media class.
pub fn resolve_file(catalog: &Catalog, share_id: &Ident, file_id: &Ident) -> Result<ResolvedFile> {
    let entry = catalog
        .get_file(share_id, file_id)?
        .ok_or(CatalogError::NotFound)?;
    Ok(ResolvedFile {
        path: entry.path,
        media_class: entry.media_class,
    })
}
