//! Path-string identifiers.
//!
//! Every share and file is keyed by the md5 hexdigest of its path *string* —
//! not of its content. Two files with identical bytes under different paths
//! get different identifiers, and renaming a file changes its identifier.
//! That is the catalog's identity model, and it keeps identifiers stable
//! across restarts as long as the path string is unchanged.

use md5::{Digest, Md5};
use rusqlite::types::{FromSql, FromSqlResult, ToSqlOutput, ValueRef};
use rusqlite::ToSql;
use serde::Serialize;
use std::fmt;

/// Opaque identifier: 32 lowercase hex characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Ident(String);

impl Ident {
    /// Derive the identifier for a path string.
    ///
    /// Pure function of the string bytes; never touches the filesystem and
    /// performs no canonicalization. Callers are expected to pass an
    /// already-absolute path.
    pub fn of_path(path: &str) -> Ident {
        let mut hasher = Md5::new();
        hasher.update(path.as_bytes());
        Ident(hex::encode(hasher.finalize()))
    }

    /// Validate an identifier received from an untrusted caller (they arrive
    /// in URLs). A malformed token can never name a catalog entry, so
    /// callers usually treat `None` as not-found.
    pub fn parse(s: &str) -> Option<Ident> {
        let valid = s.len() == 32 && s.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'));
        if valid {
            Some(Ident(s.to_string()))
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Ident {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// Stored as TEXT in the catalog database.
impl ToSql for Ident {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.0.as_str()))
    }
}

impl FromSql for Ident {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        String::column_result(value).map(Ident)
    }
}
