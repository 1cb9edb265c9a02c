/// Catalog persistence module
///
/// This module owns the durable state of the system:
/// - SQLite-backed store for shares and file entries (store.rs)
/// - Row types shared with the boundary layer (data.rs)
pub mod data;
pub mod store;

pub use data::{FileEntry, Share};
pub use store::Catalog;
