//! Media classification.
//!
//! Maps file extensions to a coarse media class. The class picks the serving
//! strategy used by the HTTP layer; files with no matching extension are
//! cataloged as `Unknown` and cannot be served.

use rusqlite::types::{FromSql, FromSqlResult, ToSqlOutput, ValueRef};
use rusqlite::ToSql;
use serde::Serialize;
use std::path::Path;

use crate::error::CatalogError;

/// Coarse content-type bucket for a cataloged file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaClass {
    Image,
    Video,
    MapTrack,
    Unknown,
}

/// Extension table. Order matters: the first class whose set contains the
/// extension wins, which makes classification a total, deterministic
/// function even if sets were ever to overlap.
const EXTENSION_TABLE: &[(MediaClass, &[&str])] = &[
    (MediaClass::Video, &["mp4"]),
    (MediaClass::MapTrack, &["gpx"]),
    (MediaClass::Image, &["jpg", "png", "jpeg"]),
];

/// How the serving wrapper should hand a file's bytes to a viewer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServeStrategy {
    /// Inline image response
    InlineImage,
    /// Range-capable streaming response
    StreamVideo,
    /// Plain binary blob (GPX tracks are fetched by the map viewer)
    Blob,
}

impl MediaClass {
    /// Classify a bare extension (no dot). Case-sensitive exact match
    /// against the table; anything else is `Unknown`. Never fails.
    pub fn from_extension(ext: &str) -> MediaClass {
        for (class, extensions) in EXTENSION_TABLE {
            if extensions.contains(&ext) {
                return *class;
            }
        }
        MediaClass::Unknown
    }

    /// The serving strategy for this class, or `UnknownMediaType` if no
    /// handler exists. The byte-serving wrapper dispatches strictly on this.
    pub fn serve_strategy(self) -> Result<ServeStrategy, CatalogError> {
        match self {
            MediaClass::Image => Ok(ServeStrategy::InlineImage),
            MediaClass::Video => Ok(ServeStrategy::StreamVideo),
            MediaClass::MapTrack => Ok(ServeStrategy::Blob),
            MediaClass::Unknown => Err(CatalogError::UnknownMediaType),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            MediaClass::Image => "image",
            MediaClass::Video => "video",
            MediaClass::MapTrack => "maptrack",
            MediaClass::Unknown => "unknown",
        }
    }

    fn from_stored(s: &str) -> MediaClass {
        match s {
            "image" => MediaClass::Image,
            "video" => MediaClass::Video,
            "maptrack" => MediaClass::MapTrack,
            _ => MediaClass::Unknown,
        }
    }
}

/// Classify a filesystem path by its extension. Dotless names have no
/// extension and come back `Unknown`.
pub fn classify_path(path: &Path) -> MediaClass {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => MediaClass::from_extension(ext),
        None => MediaClass::Unknown,
    }
}

impl ToSql for MediaClass {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for MediaClass {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value.as_str().map(MediaClass::from_stored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_table() {
        assert_eq!(MediaClass::from_extension("mp4"), MediaClass::Video);
        assert_eq!(MediaClass::from_extension("gpx"), MediaClass::MapTrack);
        assert_eq!(MediaClass::from_extension("jpg"), MediaClass::Image);
        assert_eq!(MediaClass::from_extension("png"), MediaClass::Image);
        assert_eq!(MediaClass::from_extension("jpeg"), MediaClass::Image);
        assert_eq!(MediaClass::from_extension("txt"), MediaClass::Unknown);
    }

    #[test]
    fn test_classification_is_case_sensitive() {
        assert_eq!(MediaClass::from_extension("MP4"), MediaClass::Unknown);
        assert_eq!(MediaClass::from_extension("Jpg"), MediaClass::Unknown);
    }

    #[test]
    fn test_classify_path() {
        assert_eq!(classify_path(Path::new("/data/a.jpg")), MediaClass::Image);
        assert_eq!(classify_path(Path::new("/data/clip.mp4")), MediaClass::Video);
        assert_eq!(classify_path(Path::new("/data/ride.gpx")), MediaClass::MapTrack);
        assert_eq!(classify_path(Path::new("/data/notes.txt")), MediaClass::Unknown);
        assert_eq!(classify_path(Path::new("/data/README")), MediaClass::Unknown);
    }

    #[test]
    fn test_serve_strategy_dispatch() {
        assert_eq!(MediaClass::Image.serve_strategy().unwrap(), ServeStrategy::InlineImage);
        assert_eq!(MediaClass::Video.serve_strategy().unwrap(), ServeStrategy::StreamVideo);
        assert_eq!(MediaClass::MapTrack.serve_strategy().unwrap(), ServeStrategy::Blob);
        assert!(matches!(
            MediaClass::Unknown.serve_strategy(),
            Err(CatalogError::UnknownMediaType)
        ));
    }

    #[test]
    fn test_stored_form_roundtrip() {
        for class in [
            MediaClass::Image,
            MediaClass::Video,
            MediaClass::MapTrack,
            MediaClass::Unknown,
        ] {
            assert_eq!(MediaClass::from_stored(class.as_str()), class);
        }
    }
}
