//! In-memory zip archives of directory trees.

use std::{
    fs::{self, File},
    io::{self, Cursor},
    path::{Component, Path},
    sync::Arc,
};

use anyhow::{Context, Result};
use time::OffsetDateTime;
use walkdir::WalkDir;
use zip::{write::FileOptions, CompressionMethod, DateTime, ZipWriter};

use crate::util::format_data_size;

/// A complete zip file held in memory.
///
/// Built once and never mutated afterwards, cloning only bumps a reference count
/// so every request can read from its own cursor over the same bytes.
#[derive(Debug, Clone)]
pub struct ArchiveBuffer(Arc<[u8]>);

impl ArchiveBuffer {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// A fresh reader positioned at the start of the archive
    pub fn reader(&self) -> Cursor<ArchiveBuffer> {
        Cursor::new(self.clone())
    }
}

impl AsRef<[u8]> for ArchiveBuffer {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// Walk `root` depth-first and compress everything below it into a zip archive.
///
/// Directories are stored as entries with a trailing `/`, the root itself is not stored.
/// Entry order follows the order the file system yields entries in.
/// Any I/O error aborts the whole archive.
pub fn zip_directory(root: &Path) -> Result<ArchiveBuffer> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let mut entry_count: usize = 0;

    for entry in WalkDir::new(root) {
        let entry = entry.with_context(|| format!("Failed walking {}", root.display()))?;
        if entry.depth() == 0 {
            continue;
        }
        let rel_path = entry.path().strip_prefix(root)?;
        let name = zip_entry_name(rel_path);
        let metadata = entry
            .metadata()
            .with_context(|| format!("Failed reading metadata of {}", entry.path().display()))?;
        let options = entry_options(&metadata);

        if entry.file_type().is_dir() {
            tracing::trace!("Adding directory {name}/");
            zip.add_directory(format!("{name}/"), options)?;
        } else {
            tracing::trace!("Adding file {name}");
            let mut file = File::open(entry.path())
                .with_context(|| format!("Failed opening {}", entry.path().display()))?;
            zip.start_file(name, options.compression_method(CompressionMethod::Deflated))?;
            io::copy(&mut file, &mut zip)
                .with_context(|| format!("Failed compressing {}", entry.path().display()))?;
        }
        entry_count += 1;
    }

    let buf = zip.finish()?.into_inner();
    log::debug!(
        "Archived {entry_count} entries from {} into {}",
        root.display(),
        format_data_size(buf.len() as u64)
    );
    Ok(ArchiveBuffer(buf.into()))
}

/// Zip entry names always use `/` as separator
fn zip_entry_name(rel_path: &Path) -> String {
    rel_path
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

fn entry_options(metadata: &fs::Metadata) -> FileOptions {
    let mut options = FileOptions::default();
    if let Some(modified) = metadata
        .modified()
        .ok()
        .and_then(|t| DateTime::try_from(OffsetDateTime::from(t)).ok())
    {
        options = options.last_modified_time(modified);
    }
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        options = options.unix_permissions(metadata.permissions().mode() & 0o777);
    }
    options
}
