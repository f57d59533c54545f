//! Relocation options.

use std::path::{Path, PathBuf};

use crate::build::OutputCompression;
use crate::patch::InsertionPoint;
use crate::staging::{staging_key, unique_key};

/// Directory name used below the system temp dir when no work dir is set.
pub const DEFAULT_WORK_DIR_NAME: &str = "assetshift";

/// Extension of rebuilt packages.
pub const PACKAGE_EXTENSION: &str = "unitypackage";

/// Options controlling where and how a package is relocated.
///
/// # Example
///
/// ```rust
/// use assetshift::{InsertionPoint, OutputCompression, RelocateOptions};
///
/// let options = RelocateOptions::new()
///     .work_dir("/tmp/assetshift-work")
///     .output_dir("/tmp/packages")
///     .insertion(InsertionPoint::AfterFirstSeparator)
///     .output_compression(OutputCompression::Gzip);
///
/// assert_eq!(
///     options.output_path("Author_Hat"),
///     std::path::Path::new("/tmp/packages/Author_Hat.unitypackage"),
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelocateOptions {
    /// Root for staging directories (and outputs when no output dir is set).
    pub work_dir: PathBuf,
    /// Directory receiving the rebuilt package.
    pub output_dir: Option<PathBuf>,
    /// Where the category segment is inserted.
    pub insertion: InsertionPoint,
    /// Compression of the rebuilt package.
    pub output_compression: OutputCompression,
    /// Whether every job gets a unique staging key.
    pub unique_staging: bool,
}

impl Default for RelocateOptions {
    fn default() -> Self {
        Self {
            work_dir: std::env::temp_dir().join(DEFAULT_WORK_DIR_NAME),
            output_dir: None,
            insertion: InsertionPoint::default(),
            output_compression: OutputCompression::default(),
            unique_staging: false,
        }
    }
}

impl RelocateOptions {
    /// Creates options with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the work directory.
    pub fn work_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.work_dir = dir.into();
        self
    }

    /// Sets the output directory.
    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(dir.into());
        self
    }

    /// Sets the insertion point of the category segment.
    pub fn insertion(mut self, insertion: InsertionPoint) -> Self {
        self.insertion = insertion;
        self
    }

    /// Sets the output compression.
    pub fn output_compression(mut self, compression: OutputCompression) -> Self {
        self.output_compression = compression;
        self
    }

    /// Gives every job its own staging directory and output file.
    ///
    /// Without this, jobs for the same author and title share both and must
    /// not run concurrently.
    pub fn unique_staging(mut self, unique: bool) -> Self {
        self.unique_staging = unique;
        self
    }

    /// Returns the directory holding all staging directories.
    pub fn staging_root(&self) -> PathBuf {
        self.work_dir.join("staging")
    }

    /// Returns the staging directory for `key`.
    pub fn staging_dir(&self, key: &str) -> PathBuf {
        self.staging_root().join(key)
    }

    /// Returns the output package path for `key`.
    pub fn output_path(&self, key: &str) -> PathBuf {
        let dir: &Path = self.output_dir.as_deref().unwrap_or(&self.work_dir);
        dir.join(format!("{}.{}", key, PACKAGE_EXTENSION))
    }

    /// Returns the key a job for `author` and `title` uses.
    pub(crate) fn job_key(&self, author: &str, title: &str) -> String {
        let key = staging_key(author, title);
        if self.unique_staging {
            unique_key(&key)
        } else {
            key
        }
    }
}
