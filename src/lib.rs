//! home-share: a content-addressed catalog of shared folders.
//!
//! The catalog maps folders ("shares") and the files under them to stable
//! identifiers derived from their path strings, and keeps that mapping
//! reconciled with a filesystem that can change underneath it at any time.
//! The HTTP layer, session handling, and byte-serving are external
//! collaborators; this crate is the engine they call into.
//!
//! - [`ident`] — path-string identity derivation
//! - [`media`] — extension to media-class table and serving dispatch
//! - [`catalog`] — the SQLite-backed store for shares and file entries
//! - [`scan`] — folder tree scanning for the admin picker
//! - [`share`] — share creation and the viewer-facing file views
//! - [`reconcile`] — drift detection and reindexing
//! - [`config`] — environment-driven configuration

pub mod catalog;
pub mod config;
pub mod error;
pub mod ident;
pub mod media;
pub mod reconcile;
pub mod scan;
pub mod share;

pub use catalog::{Catalog, FileEntry, Share};
pub use config::Config;
pub use error::CatalogError;
pub use ident::Ident;
pub use media::{MediaClass, ServeStrategy};
pub use reconcile::{DriftReport, ReindexOutcome};
pub use share::{MediaRef, ResolvedFile, WalkDepth};
