use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::{Path, PathBuf};
use tracing::debug;

use super::data::{FileEntry, Share};
use crate::error::Result;
use crate::ident::Ident;

/// The Catalog manages the SQLite database holding shares and file entries.
///
/// Two collections are persisted: `shares` (identifier -> root path) and
/// `files` (share + file identifier -> path and media class). Every mutation
/// is a single autocommit statement, so each insert or delete is immediately
/// durable on its own — there is no transaction spanning multiple calls.
/// That property is what makes reindex observably non-atomic (see the
/// reconcile module).
///
/// The connection sits behind a mutex: concurrent requests may hit the same
/// catalog, and conflicting writes must serialize rather than silently lose
/// one side.
pub struct Catalog {
    conn: Mutex<Connection>,
    db_path: Option<PathBuf>,
}

impl Catalog {
    /// Open (or create) the catalog database at the given path.
    ///
    /// The parent directory is created if needed, so a fresh install can
    /// point at ~/.local/share/home-share/catalog.db and just work.
    pub fn open(db_path: &Path) -> Result<Catalog> {
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(db_path)?;
        Self::init_schema(&conn)?;

        debug!(path = %db_path.display(), "catalog opened");

        Ok(Catalog {
            conn: Mutex::new(conn),
            db_path: Some(db_path.to_path_buf()),
        })
    }

    /// In-memory catalog, used by tests.
    pub fn open_in_memory() -> Result<Catalog> {
        let conn = Connection::open_in_memory()?;
        Self::init_schema(&conn)?;
        Ok(Catalog {
            conn: Mutex::new(conn),
            db_path: None,
        })
    }

    /// Create the tables if they don't exist yet.
    fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS shares (
                id          TEXT PRIMARY KEY,
                path        TEXT NOT NULL,
                created_at  INTEGER NOT NULL
            )",
            [],
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS files (
                share_id    TEXT NOT NULL,
                id          TEXT NOT NULL,
                path        TEXT NOT NULL,
                media_class TEXT NOT NULL,
                PRIMARY KEY (share_id, id)
            )",
            [],
        )?;

        Ok(())
    }

    /// Path of the database file, if this catalog is file-backed.
    pub fn path(&self) -> Option<&PathBuf> {
        self.db_path.as_ref()
    }

    /// Number of shares in the catalog.
    pub fn share_count(&self) -> Result<i64> {
        let conn = self.conn.lock();
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM shares", [], |row| row.get(0))?;
        Ok(count)
    }

    /// Insert a share. Fails if a share with the same identifier exists.
    pub fn put_share(&self, share: &Share) -> Result<()> {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO shares (id, path, created_at) VALUES (?1, ?2, ?3)",
            params![share.id, share.path, share.created_at],
        )?;
        Ok(())
    }

    /// Look up a share by identifier. A missing key is `Ok(None)`.
    pub fn get_share(&self, id: &Ident) -> Result<Option<Share>> {
        let conn = self.conn.lock();
        let share = conn
            .query_row(
                "SELECT id, path, created_at FROM shares WHERE id = ?1",
                params![id],
                |row| {
                    Ok(Share {
                        id: row.get(0)?,
                        path: row.get(1)?,
                        created_at: row.get(2)?,
                    })
                },
            )
            .optional()?;
        Ok(share)
    }

    /// Whether a share with this identifier exists. The tree scanner probes
    /// this for every directory node it emits.
    pub fn is_shared(&self, id: &Ident) -> Result<bool> {
        Ok(self.get_share(id)?.is_some())
    }

    /// All shares, in storage iteration order (no guaranteed sort).
    pub fn list_shares(&self) -> Result<Vec<Share>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare("SELECT id, path, created_at FROM shares")?;

        let share_iter = stmt.query_map([], |row| {
            Ok(Share {
                id: row.get(0)?,
                path: row.get(1)?,
                created_at: row.get(2)?,
            })
        })?;

        let mut shares = Vec::new();
        for share in share_iter {
            shares.push(share?);
        }

        Ok(shares)
    }

    /// Delete a share and all of its file entries.
    ///
    /// The cascade runs files-first so a crash in between leaves an empty
    /// share rather than orphaned file rows. Deleting an unknown identifier
    /// is a no-op.
    pub fn delete_share(&self, id: &Ident) -> Result<()> {
        {
            let conn = self.conn.lock();
            conn.execute("DELETE FROM files WHERE share_id = ?1", params![id])?;
            conn.execute("DELETE FROM shares WHERE id = ?1", params![id])?;
        }
        debug!(share = %id, "share deleted");
        Ok(())
    }

    /// Insert a file entry. Fails if `(share_id, file_id)` already exists.
    pub fn put_file(&self, entry: &FileEntry) -> Result<()> {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO files (share_id, id, path, media_class) VALUES (?1, ?2, ?3, ?4)",
            params![entry.share_id, entry.file_id, entry.path, entry.media_class],
        )?;
        Ok(())
    }

    /// Look up one file within a share. A missing key is `Ok(None)`.
    pub fn get_file(&self, share_id: &Ident, file_id: &Ident) -> Result<Option<FileEntry>> {
        let conn = self.conn.lock();
        let entry = conn
            .query_row(
                "SELECT share_id, id, path, media_class FROM files
                 WHERE share_id = ?1 AND id = ?2",
                params![share_id, file_id],
                |row| {
                    Ok(FileEntry {
                        share_id: row.get(0)?,
                        file_id: row.get(1)?,
                        path: row.get(2)?,
                        media_class: row.get(3)?,
                    })
                },
            )
            .optional()?;
        Ok(entry)
    }

    /// All file entries of a share. An unknown share yields an empty list.
    pub fn list_files(&self, share_id: &Ident) -> Result<Vec<FileEntry>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT share_id, id, path, media_class FROM files WHERE share_id = ?1",
        )?;

        let entry_iter = stmt.query_map(params![share_id], |row| {
            Ok(FileEntry {
                share_id: row.get(0)?,
                file_id: row.get(1)?,
                path: row.get(2)?,
                media_class: row.get(3)?,
            })
        })?;

        let mut entries = Vec::new();
        for entry in entry_iter {
            entries.push(entry?);
        }

        Ok(entries)
    }

    /// Delete every file entry of a share, returning how many were removed.
    pub fn delete_files(&self, share_id: &Ident) -> Result<usize> {
        let conn = self.conn.lock();
        let removed = conn.execute("DELETE FROM files WHERE share_id = ?1", params![share_id])?;
        Ok(removed)
    }
}

impl std::fmt::Debug for Catalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Catalog").field("db_path", &self.db_path).finish()
    }
}
