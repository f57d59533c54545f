//! The relocation pipeline.
//!
//! A job moves through a fixed sequence of phases:
//!
//! ```text
//! Idle -> Staging -> CountingEntries -> Extracting -> Building -> Finalizing -> Done
//!            \______________\_______________\____________\
//!                                                         -> AbortedWithFallback
//! ```
//!
//! Transitions are forward-only. Any failure from `Staging` through
//! `Building` aborts the job: a [`Diagnostic`] is logged, the staging
//! directory and any partial output are removed and the job returns the
//! path of the untouched source package.
//!
//! # Example
//!
//! ```rust,no_run
//! use assetshift::{RelocateOptions, RelocateRequest, Relocator, NoProgress};
//!
//! let relocator = Relocator::new(RelocateOptions::new().output_dir("./packages"));
//! let request = RelocateRequest::new("Hat.unitypackage", "Clothing", "Author", "Hat");
//! let relocation = relocator.relocate(&request, &mut NoProgress);
//!
//! if relocation.is_relocated() {
//!     println!("import {}", relocation.path.display());
//! } else {
//!     println!("falling back to {}", relocation.path.display());
//! }
//! ```

mod diagnostic;
mod job;
mod options;

use std::fmt;
use std::path::{Path, PathBuf};

pub use diagnostic::Diagnostic;
pub use job::RelocationJob;
pub use options::{DEFAULT_WORK_DIR_NAME, PACKAGE_EXTENSION, RelocateOptions};

use crate::progress::ProgressSink;
use crate::{Error, Result};

/// Phase of a relocation job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Phase {
    /// Not started.
    Idle,
    /// Validating input and preparing the staging directory.
    Staging,
    /// Counting the entries of the source package.
    CountingEntries,
    /// Decoding, patching and materializing entries.
    Extracting,
    /// Serializing the staging manifest into the output package.
    Building,
    /// Removing the staging directory.
    Finalizing,
    /// Finished; the output package is complete.
    Done,
    /// Failed; the source package is returned instead.
    AbortedWithFallback,
}

impl Phase {
    /// Returns the human-readable label reported with progress updates.
    pub fn label(self) -> &'static str {
        match self {
            Self::Idle => "Idle",
            Self::Staging => "Staging",
            Self::CountingEntries => "Counting entries",
            Self::Extracting => "Extracting",
            Self::Building => "Building",
            Self::Finalizing => "Finalizing",
            Self::Done => "Done",
            Self::AbortedWithFallback => "Aborted",
        }
    }

    /// Returns `true` for `Done` and `AbortedWithFallback`.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::AbortedWithFallback)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Inputs of one relocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelocateRequest {
    /// The source package.
    pub source: PathBuf,
    /// The category label to insert.
    pub category: String,
    /// Item author, part of the staging key.
    pub author: String,
    /// Item title, part of the staging key.
    pub title: String,
}

impl RelocateRequest {
    /// Creates a request.
    pub fn new(
        source: impl Into<PathBuf>,
        category: impl Into<String>,
        author: impl Into<String>,
        title: impl Into<String>,
    ) -> Self {
        Self {
            source: source.into(),
            category: category.into(),
            author: author.into(),
            title: title.into(),
        }
    }
}

/// Outcome of a relocation.
///
/// `path` is always usable: the rebuilt package on success, the untouched
/// source package on failure.
#[derive(Debug)]
pub struct Relocation {
    /// Path to import.
    pub path: PathBuf,
    /// Terminal phase, `Done` or `AbortedWithFallback`.
    pub phase: Phase,
    /// Number of entries written to the output package.
    pub entries: usize,
    /// The error that aborted the job.
    pub error: Option<Error>,
    /// Diagnostic logged for the failure.
    pub diagnostic: Option<Diagnostic>,
}

impl Relocation {
    fn done(path: PathBuf, entries: usize) -> Self {
        Self {
            path,
            phase: Phase::Done,
            entries,
            error: None,
            diagnostic: None,
        }
    }

    /// Builds a fallback outcome for `source` and logs its diagnostic.
    pub(crate) fn fallback(source: &Path, failed_in: Phase, error: Error) -> Self {
        let diagnostic = Diagnostic::capture(&error, failed_in, source);
        diagnostic.log();
        Self {
            path: source.to_path_buf(),
            phase: Phase::AbortedWithFallback,
            entries: 0,
            error: Some(error),
            diagnostic: Some(diagnostic),
        }
    }

    /// Returns `true` if a new package was produced.
    pub fn is_relocated(&self) -> bool {
        self.phase == Phase::Done
    }

    /// Returns `true` if the job fell back to the source package.
    pub fn is_fallback(&self) -> bool {
        self.phase == Phase::AbortedWithFallback
    }

    /// Converts into the new package path or the error that aborted the job.
    pub fn into_result(self) -> Result<PathBuf> {
        match self.error {
            Some(e) => Err(e),
            None => Ok(self.path),
        }
    }
}

/// Runs relocation jobs with a fixed set of options.
#[derive(Debug, Clone, Default)]
pub struct Relocator {
    options: RelocateOptions,
}

impl Relocator {
    /// Creates a relocator.
    pub fn new(options: RelocateOptions) -> Self {
        Self { options }
    }

    /// Returns the options.
    pub fn options(&self) -> &RelocateOptions {
        &self.options
    }

    /// Relocates one package.
    ///
    /// Never fails: errors are logged and turned into a fallback outcome
    /// pointing at the source package.
    pub fn relocate(&self, request: &RelocateRequest, progress: &mut dyn ProgressSink) -> Relocation {
        let mut job = RelocationJob::new(request, &self.options);
        log::debug!(
            "Relocating '{}' into category '{}'",
            request.source.display(),
            request.category
        );

        match job.run(&self.options, progress) {
            Ok(entries) => Relocation::done(job.output().to_path_buf(), entries),
            Err(error) => {
                let failed_in = job.abort();
                Relocation::fallback(job.source(), failed_in, error)
            }
        }
    }

    /// Relocates one package, returning the error instead of falling back.
    ///
    /// Cleanup happens exactly as with [`relocate`](Self::relocate).
    pub fn try_relocate(&self, request: &RelocateRequest, progress: &mut dyn ProgressSink) -> Result<PathBuf> {
        let mut job = RelocationJob::new(request, &self.options);
        match job.run(&self.options, progress) {
            Ok(_) => Ok(job.output().to_path_buf()),
            Err(error) => {
                job.abort();
                Err(error)
            }
        }
    }
}

/// Relocates `source` into `category` with default options.
///
/// Returns the outcome; `outcome.path` is the package to import.
pub fn relocate(
    source: impl AsRef<Path>,
    category: &str,
    author: &str,
    title: &str,
    progress: &mut dyn ProgressSink,
) -> Relocation {
    let request = RelocateRequest::new(source.as_ref(), category, author, title);
    Relocator::default().relocate(&request, progress)
}

/// Relocates `source` into `category` with default options, returning errors.
pub fn try_relocate(
    source: impl AsRef<Path>,
    category: &str,
    author: &str,
    title: &str,
    progress: &mut dyn ProgressSink,
) -> Result<PathBuf> {
    let request = RelocateRequest::new(source.as_ref(), category, author, title);
    Relocator::default().try_relocate(&request, progress)
}
