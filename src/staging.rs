//! Staging directory management and entry materialization.
//!
//! Each relocation job owns one staging directory, keyed by the item's
//! author and title. The directory is cleared when the job starts (overwrite,
//! not merge) and removed when the job ends, whatever the outcome.
//!
//! Jobs that share a key share the directory: a second job started with the
//! same key deletes the first job's staging tree. Callers that need isolated
//! concurrent jobs use [`unique_key`] to derive a per-job key.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use crate::entry::{EntryKind, RawEntry};
use crate::{EntryPath, Error, Result};

/// Key used when neither author nor title leave any usable characters.
pub const FALLBACK_KEY: &str = "untitled";

/// Characters that are invalid in file names on at least one major platform.
const INVALID_FILE_NAME_CHARS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

static UNIQUE_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Derives the staging key for an item.
///
/// Characters that are invalid in file names are removed from both parts,
/// trailing dots and spaces are trimmed and the non-empty parts are joined
/// with `_`.
///
/// # Examples
///
/// ```
/// use assetshift::staging::staging_key;
///
/// assert_eq!(staging_key("Author", "Cool Hat"), "Author_Cool Hat");
/// assert_eq!(staging_key("A/B", "Hat?"), "AB_Hat");
/// assert_eq!(staging_key("", ""), "untitled");
/// ```
pub fn staging_key(author: &str, title: &str) -> String {
    let parts: Vec<String> = [author, title]
        .into_iter()
        .map(sanitize_component)
        .filter(|part| !part.is_empty())
        .collect();

    if parts.is_empty() {
        FALLBACK_KEY.to_string()
    } else {
        parts.join("_")
    }
}

/// Appends a per-process unique suffix to `key`.
///
/// The suffix combines the process id with a process-wide counter, so two
/// calls never return the same key within one process.
pub fn unique_key(key: &str) -> String {
    let n = UNIQUE_COUNTER.fetch_add(1, Ordering::Relaxed);
    format!("{}-{}-{}", key, std::process::id(), n)
}

fn sanitize_component(s: &str) -> String {
    let cleaned: String = s
        .chars()
        .filter(|c| !c.is_control() && !INVALID_FILE_NAME_CHARS.contains(c))
        .collect();
    cleaned
        .trim()
        .trim_end_matches(['.', ' '])
        .to_string()
}

/// An entry written to the staging directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedEntry {
    /// The entry name as it appeared in the source package.
    pub name: EntryPath,
    /// Absolute location below the staging root.
    pub path: PathBuf,
    /// File or directory.
    pub kind: EntryKind,
    /// Permission bits carried over from the source header.
    pub mode: u32,
    /// Modification time carried over from the source header.
    pub mtime: u64,
}

impl StagedEntry {
    /// Returns `true` if this entry is a directory.
    pub fn is_directory(&self) -> bool {
        self.kind.is_directory()
    }
}

/// A job's staging directory.
///
/// The directory is removed when the value is dropped unless
/// [`remove`](Self::remove) already did so.
#[derive(Debug)]
pub struct StagingArea {
    root: PathBuf,
    removed: bool,
}

impl StagingArea {
    /// Prepares a fresh, empty staging directory at `root`.
    ///
    /// A directory left at `root` by an earlier or concurrent job is deleted
    /// first.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Staging`] if the old directory cannot be removed or
    /// the new one cannot be created.
    pub fn prepare(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();

        match fs::remove_dir_all(&root) {
            Ok(()) => log::debug!("Removed stale staging directory '{}'", root.display()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(Error::staging(root, e)),
        }
        fs::create_dir_all(&root).map_err(|e| Error::staging(&root, e))?;

        Ok(Self {
            root,
            removed: false,
        })
    }

    /// Returns the staging root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Writes one entry below the staging root.
    ///
    /// Directories are created idempotently; files are written with their
    /// parent directories created as needed.
    pub fn materialize(&self, entry: &RawEntry) -> Result<StagedEntry> {
        let path = entry.name.to_path_under(&self.root);

        match entry.kind {
            EntryKind::Directory => {
                fs::create_dir_all(&path).map_err(|e| Error::staging(&path, e))?;
            }
            EntryKind::File => {
                if let Some(parent) = path.parent() {
                    fs::create_dir_all(parent).map_err(|e| Error::staging(parent, e))?;
                }
                fs::write(&path, &entry.content).map_err(|e| Error::staging(&path, e))?;
            }
        }

        Ok(StagedEntry {
            name: entry.name.clone(),
            path,
            kind: entry.kind,
            mode: entry.mode,
            mtime: entry.mtime,
        })
    }

    /// Removes the staging directory.
    ///
    /// A directory that is already gone counts as removed.
    pub fn remove(mut self) -> Result<()> {
        self.removed = true;
        remove_tree(&self.root)
    }
}

impl Drop for StagingArea {
    fn drop(&mut self) {
        if self.removed {
            return;
        }
        if let Err(e) = remove_tree(&self.root) {
            log::warn!("Failed to clean up staging directory: {}", e);
        }
    }
}

fn remove_tree(root: &Path) -> Result<()> {
    match fs::remove_dir_all(root) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(Error::staging(root, e)),
    }
}
