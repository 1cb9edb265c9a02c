//! Folder tree scanning.
//!
//! Builds the JSON tree the admin folder picker renders: every entry under a
//! root, annotated with size, identifier, and whether a directory is already
//! shared. The scan is a fresh, full walk every time — nothing is cached —
//! and it never fails wholesale: a subtree the process cannot read is
//! silently skipped, so one locked-down directory doesn't take the whole
//! picker down with it.

use serde::Serialize;
use std::fs;
use std::path::Path;
use tracing::warn;

use crate::catalog::Catalog;
use crate::ident::Ident;

/// One node of the scanned tree. Serializes to the shape the admin UI
/// consumes.
#[derive(Debug, Clone, Serialize)]
pub struct TreeNode {
    pub name: String,
    /// Path relative to the scan root
    pub path: String,
    /// Human-readable size, e.g. "1.5 MB"
    pub size: String,
    pub size_bytes: u64,
    /// Whether a share already exists for this directory (always false for
    /// plain files)
    pub is_shared: bool,
    pub id: Ident,
    pub children: Vec<TreeNode>,
}

/// Scan the folder tree under `root`.
///
/// Directory sizes are the recursive sum of contained file sizes, recomputed
/// on every call. Identifiers are derived from each entry's path exactly as
/// passed in, so `root` should be absolute for them to line up with the
/// catalog. Unreadable directories yield empty children and size 0.
pub fn folder_tree(catalog: &Catalog, root: &Path) -> Vec<TreeNode> {
    scan_dir(catalog, root, root)
}

fn scan_dir(catalog: &Catalog, root: &Path, dir: &Path) -> Vec<TreeNode> {
    let mut tree = Vec::new();

    // Silent-skip policy: a directory we cannot list contributes nothing.
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(_) => return tree,
    };

    for entry in entries.flatten() {
        let path = entry.path();
        let name = entry.file_name().to_string_lossy().to_string();
        let rel_path = path
            .strip_prefix(root)
            .unwrap_or(&path)
            .to_string_lossy()
            .to_string();
        let id = Ident::of_path(&path.to_string_lossy());

        if path.is_dir() {
            let children = scan_dir(catalog, root, &path);
            let size_bytes = folder_size(&path);

            // A failing probe only costs the annotation, not the scan.
            let is_shared = catalog.is_shared(&id).unwrap_or_else(|err| {
                warn!(path = %path.display(), %err, "share probe failed during scan");
                false
            });

            tree.push(TreeNode {
                name,
                path: rel_path,
                size: format_size(size_bytes),
                size_bytes,
                is_shared,
                id,
                children,
            });
        } else if path.is_file() {
            let size_bytes = fs::metadata(&path).map(|m| m.len()).unwrap_or(0);
            tree.push(TreeNode {
                name,
                path: rel_path,
                size: format_size(size_bytes),
                size_bytes,
                is_shared: false,
                id,
                children: Vec::new(),
            });
        }
        // anything else (broken symlink, socket, ...) is not catalogable
    }

    tree
}

/// Total size of a folder, recursing into subdirectories. Unreadable
/// subtrees count as 0.
pub fn folder_size(path: &Path) -> u64 {
    let entries = match fs::read_dir(path) {
        Ok(entries) => entries,
        Err(_) => return 0,
    };

    let mut total = 0;
    for entry in entries.flatten() {
        let entry_path = entry.path();
        if entry_path.is_file() {
            total += fs::metadata(&entry_path).map(|m| m.len()).unwrap_or(0);
        } else if entry_path.is_dir() {
            total += folder_size(&entry_path);
        }
    }
    total
}

/// Format a byte count for humans: "512.0 B", "1.5 MB", ...
pub fn format_size(size: u64) -> String {
    let mut size = size as f64;
    for unit in ["B", "KB", "MB", "GB"] {
        if size < 1024.0 {
            return format!("{size:.1} {unit}");
        }
        size /= 1024.0;
    }
    format!("{size:.1} TB")
}
