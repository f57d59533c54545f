//! Archive builder: serializes staged entries into a new package.
//!
//! The builder works from the staging manifest, so the rebuilt archive holds
//! exactly the entries of the source package, in source order. Content is
//! read back from the staging directory, which is where the patched
//! descriptors live.
//!
//! The archive is written to a sibling `<name>.partial` file and renamed into
//! place once complete. A failed build never leaves a truncated archive at
//! the output path.

use std::collections::HashSet;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use flate2::Compression;
use flate2::write::GzEncoder;
use tar::{EntryType, Header};
use walkdir::WalkDir;

use crate::staging::StagedEntry;
use crate::{Error, Result};

/// Suffix of the temporary file an archive is written to.
pub const PARTIAL_SUFFIX: &str = ".partial";

/// Compression applied to the rebuilt archive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputCompression {
    /// Plain tar stream.
    ///
    /// Unity imports both forms; this keeps the rebuilt package byte-stable
    /// with respect to the staged content.
    #[default]
    Uncompressed,
    /// gzip-compressed tar stream, matching the usual package layout.
    Gzip,
}

/// Serializes a staging manifest into an archive.
#[derive(Debug, Clone, Default)]
pub struct ArchiveBuilder {
    compression: OutputCompression,
}

impl ArchiveBuilder {
    /// Creates a builder producing an uncompressed tar stream.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the output compression.
    pub fn compression(mut self, compression: OutputCompression) -> Self {
        self.compression = compression;
        self
    }

    /// Writes `entries` to `output`.
    ///
    /// Every entry must live below `staging_root`. After the entries are
    /// written the staging tree is checked for files that are not part of
    /// the manifest; finding one fails the build with
    /// [`Error::StagingConflict`].
    ///
    /// Returns the number of entries written.
    pub fn build(&self, staging_root: &Path, entries: &[StagedEntry], output: &Path) -> Result<usize> {
        let partial = partial_path(output);

        if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| Error::output(parent, e))?;
        }

        let result = self
            .write_archive(entries, &partial)
            .and_then(|()| check_staging_tree(staging_root, entries))
            .and_then(|()| fs::rename(&partial, output).map_err(|e| Error::output(output, e)));

        if result.is_err() {
            discard_partial(&partial);
        }
        result.map(|()| entries.len())
    }

    fn write_archive(&self, entries: &[StagedEntry], partial: &Path) -> Result<()> {
        let file = File::create(partial).map_err(|e| Error::output(partial, e))?;
        let writer = BufWriter::new(file);

        let writer = match self.compression {
            OutputCompression::Uncompressed => write_entries(writer, entries, partial)?,
            OutputCompression::Gzip => {
                let encoder = GzEncoder::new(writer, Compression::default());
                write_entries(encoder, entries, partial)?
                    .finish()
                    .map_err(|e| Error::output(partial, e))?
            }
        };

        let file = writer
            .into_inner()
            .map_err(|e| Error::output(partial, e.into_error()))?;
        file.sync_all().map_err(|e| Error::output(partial, e))?;
        Ok(())
    }
}

fn write_entries<W: Write>(writer: W, entries: &[StagedEntry], partial: &Path) -> Result<W> {
    let mut builder = tar::Builder::new(writer);

    for entry in entries {
        let mut header = Header::new_gnu();
        header.set_mode(entry.mode);
        header.set_mtime(entry.mtime);

        if entry.is_directory() {
            header.set_entry_type(EntryType::Directory);
            header.set_size(0);
            builder
                .append_data(&mut header, entry.name.as_str(), io::empty())
                .map_err(|e| Error::output(partial, e))?;
        } else {
            let content = fs::read(&entry.path).map_err(|e| Error::staging(&entry.path, e))?;
            header.set_entry_type(EntryType::Regular);
            header.set_size(content.len() as u64);
            builder
                .append_data(&mut header, entry.name.as_str(), content.as_slice())
                .map_err(|e| Error::output(partial, e))?;
        }
    }

    builder.into_inner().map_err(|e| Error::output(partial, e))
}

/// Fails if the staging tree holds anything the manifest does not account for.
fn check_staging_tree(root: &Path, entries: &[StagedEntry]) -> Result<()> {
    let mut expected: HashSet<&Path> = HashSet::new();
    for entry in entries {
        // Parents of files staged without a directory entry are implicit
        for ancestor in entry.path.ancestors() {
            if ancestor == root || !ancestor.starts_with(root) {
                break;
            }
            expected.insert(ancestor);
        }
    }

    for item in WalkDir::new(root).min_depth(1) {
        let item = item.map_err(|e| {
            let path = e.path().unwrap_or(root).to_path_buf();
            Error::staging(path, e.into())
        })?;
        if !expected.contains(item.path()) {
            return Err(Error::StagingConflict {
                path: item.path().to_path_buf(),
            });
        }
    }
    Ok(())
}

/// Returns the temporary path an archive for `output` is written to.
pub fn partial_path(output: &Path) -> PathBuf {
    let mut name = output
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(PARTIAL_SUFFIX);
    output.with_file_name(name)
}

/// Best-effort removal of a partial archive.
pub(crate) fn discard_partial(partial: &Path) {
    match fs::remove_file(partial) {
        Ok(()) => log::debug!("Removed partial output '{}'", partial.display()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => log::warn!(
            "Failed to clean up partial output '{}': {}",
            partial.display(),
            e
        ),
    }
}
