//! Directory listing collaborator.
//!
//! # Responsibilities
//! - Read a directory and stat its entries
//! - Order entries by name, size or modification time
//! - Render the HTML listing page (render.rs)
//!
//! # Design Decisions
//! - Default order is most recently modified first
//! - Symlinks are followed for size/mtime; dangling ones are skipped
//! - Listing never touches the handler cache

pub mod render;

use std::cmp::Reverse;
use std::io;
use std::path::Path;
use std::time::SystemTime;

use serde::Deserialize;

pub use render::render_listing;

/// Query parameters accepted on directory paths.
#[derive(Debug, Default, Deserialize)]
pub struct ListingParams {
    pub sort: Option<String>,
}

/// Ordering applied to a listing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    /// Name, ascending.
    Name,
    /// Size in bytes, ascending.
    Size,
    /// Modification time, newest first.
    #[default]
    Modified,
}

impl SortOrder {
    /// Parse the `sort` query value; unknown values fall back to the default.
    pub fn from_query(value: Option<&str>) -> Self {
        match value {
            Some("name") => SortOrder::Name,
            Some("size") => SortOrder::Size,
            _ => SortOrder::Modified,
        }
    }
}

/// One row of a directory listing.
#[derive(Debug, Clone)]
pub struct ListingEntry {
    pub name: String,
    pub is_dir: bool,
    pub size: u64,
    pub modified: SystemTime,
}

/// Read `dir` and return its entries in `order`.
pub async fn read_listing(dir: &Path, order: SortOrder) -> io::Result<Vec<ListingEntry>> {
    let mut entries = Vec::new();
    let mut read_dir = tokio::fs::read_dir(dir).await?;

    while let Some(entry) = read_dir.next_entry().await? {
        let path = entry.path();
        let metadata = match tokio::fs::metadata(&path).await {
            Ok(m) => m,
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "Skipping unreadable entry");
                continue;
            }
        };
        entries.push(ListingEntry {
            name: entry.file_name().to_string_lossy().into_owned(),
            is_dir: metadata.is_dir(),
            size: metadata.len(),
            modified: metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH),
        });
    }

    sort_entries(&mut entries, order);
    Ok(entries)
}

/// Sort in place; ties are broken by name so output is deterministic.
pub fn sort_entries(entries: &mut [ListingEntry], order: SortOrder) {
    match order {
        SortOrder::Name => entries.sort_by(|a, b| a.name.cmp(&b.name)),
        SortOrder::Size => entries.sort_by(|a, b| a.size.cmp(&b.size).then_with(|| a.name.cmp(&b.name))),
        SortOrder::Modified => entries.sort_by(|a, b| {
            Reverse(a.modified)
                .cmp(&Reverse(b.modified))
                .then_with(|| a.name.cmp(&b.name))
        }),
    }
}
