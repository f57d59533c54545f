//! Error types for package relocation.
//!
//! This module provides the [`Error`] enum which represents every failure the
//! relocation pipeline can run into, the coarse [`ErrorKind`] taxonomy used
//! for reporting, and a convenient [`Result<T>`] type alias.
//!
//! # Error Handling
//!
//! The building blocks ([`ArchiveDecoder`], [`PathPatcher`], [`StagingArea`],
//! [`ArchiveBuilder`]) return `Result<T, Error>` and are composed with `?`.
//! The pipeline entry point [`relocate`] never returns an error: it converts
//! every failure into a fallback [`Relocation`] that points at the untouched
//! source archive. Use [`try_relocate`] when the raw error is preferred.
//!
//! ```rust,no_run
//! use assetshift::{Error, ErrorKind, NoProgress, try_relocate};
//!
//! fn run(path: &str) -> assetshift::Result<()> {
//!     match try_relocate(path, "Clothing", "Author", "Title", &mut NoProgress) {
//!         Ok(output) => println!("relocated into {}", output.display()),
//!         Err(e) if e.kind() == ErrorKind::Format => {
//!             eprintln!("Not a valid Unity package: {}", e);
//!         }
//!         Err(Error::Cancelled) => eprintln!("Cancelled"),
//!         Err(e) => return Err(e),
//!     }
//!     Ok(())
//! }
//! ```
//!
//! [`ArchiveDecoder`]: crate::decode::ArchiveDecoder
//! [`PathPatcher`]: crate::patch::PathPatcher
//! [`StagingArea`]: crate::staging::StagingArea
//! [`ArchiveBuilder`]: crate::build::ArchiveBuilder
//! [`relocate`]: crate::relocate
//! [`try_relocate`]: crate::try_relocate
//! [`Relocation`]: crate::pipeline::Relocation

use std::io;
use std::path::PathBuf;

/// Coarse classification of an [`Error`].
///
/// | Kind | Typical cause |
/// |------|---------------|
/// | [`Format`][Self::Format] | Invalid gzip or tar framing, malformed path descriptor |
/// | [`Io`][Self::Io] | Staging directory or output file operations |
/// | [`Pipeline`][Self::Pipeline] | Anything else: bad input, cancellation, inconsistent passes |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The source package is malformed.
    Format,
    /// A file system operation failed.
    Io,
    /// Catch-all for other pipeline faults.
    Pipeline,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Format => write!(f, "format error"),
            Self::Io => write!(f, "I/O error"),
            Self::Pipeline => write!(f, "pipeline failure"),
        }
    }
}

/// The main error type for relocation operations.
///
/// Each variant carries enough context to produce a useful diagnostic. Use
/// [`Error::kind`] to map a variant onto the three reporting categories.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// An I/O error occurred while reading the source package.
    ///
    /// Raised for failures of the underlying reader itself (file not found,
    /// permission denied, read errors). Problems with the bytes that were read
    /// are reported as [`InvalidFormat`][Self::InvalidFormat] instead.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The gzip or tar framing of the package is invalid.
    ///
    /// This covers a missing gzip signature, corrupt deflate data, a failed
    /// gzip trailer check, tar header checksum mismatches and truncated
    /// blocks.
    #[error("Invalid package format: {0}")]
    InvalidFormat(String),

    /// An entry name cannot be used as a relative path.
    ///
    /// Names must be valid UTF-8, relative, free of NUL bytes and must not
    /// contain `..` segments.
    #[error("Invalid entry name '{name}': {reason}")]
    InvalidEntryName {
        /// The offending entry name (lossily decoded).
        name: String,
        /// Why the name was rejected.
        reason: &'static str,
    },

    /// Two entries map to the same location.
    ///
    /// Names that differ only in `.` or empty segments, like `abc/asset`
    /// and `abc/./asset`, count as the same location.
    #[error("Entry '{name}' collides with earlier entry '{previous}'")]
    DuplicateEntry {
        /// The later entry name.
        name: String,
        /// The earlier entry mapping to the same location.
        previous: String,
    },

    /// The package contains an entry that is neither a file nor a directory.
    #[error("Unsupported entry type '{entry_type}' for entry '{name}'")]
    UnsupportedEntryType {
        /// The entry name.
        name: String,
        /// Debug rendering of the tar entry type.
        entry_type: String,
    },

    /// A `pathname` descriptor is shorter than the insertion offset.
    #[error(
        "Path descriptor '{entry}' is {len} bytes long, shorter than the insertion offset {offset}"
    )]
    PathDescriptorTooShort {
        /// The descriptor entry name.
        entry: String,
        /// Length of the descriptor content in bytes.
        len: usize,
        /// The configured insertion offset.
        offset: usize,
    },

    /// A `pathname` descriptor has no path separator to insert after.
    #[error("Path descriptor '{entry}' contains no path separator")]
    MissingSeparator {
        /// The descriptor entry name.
        entry: String,
    },

    /// A `pathname` descriptor cannot be patched as text.
    #[error("Path descriptor '{entry}' cannot be patched: {reason}")]
    InvalidPathDescriptor {
        /// The descriptor entry name.
        entry: String,
        /// Why the content was rejected.
        reason: &'static str,
    },

    /// A staging directory operation failed.
    #[error("Staging operation failed at '{}': {source}", path.display())]
    Staging {
        /// The path being created, written or removed.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// Creating or writing the output package failed.
    #[error("Failed to write output package '{}': {source}", path.display())]
    Output {
        /// The output path.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The category label cannot be used as a single path segment.
    #[error("Invalid category label '{label}': {reason}")]
    InvalidCategory {
        /// The rejected label.
        label: String,
        /// Why the label was rejected.
        reason: &'static str,
    },

    /// The counting pass and the processing pass disagree.
    ///
    /// This happens when the source package is modified between the two
    /// passes.
    #[error("Entry count changed between passes: counted {expected}, processed {actual}")]
    EntryCountMismatch {
        /// Entries seen by the counting pass.
        expected: usize,
        /// Entries seen by the processing pass.
        actual: usize,
    },

    /// The staging directory holds files this job did not write.
    ///
    /// Another job using the same staging key is the usual cause.
    #[error("Staging directory contains foreign file '{}'", path.display())]
    StagingConflict {
        /// The unexpected file.
        path: PathBuf,
    },

    /// The output path resolves to the source package.
    #[error("Output path '{}' would overwrite the source package", path.display())]
    OutputIsSource {
        /// The rejected output path.
        path: PathBuf,
    },

    /// The operation was cancelled through the progress sink.
    #[error("Operation cancelled")]
    Cancelled,

    /// Any other fault, always carrying its original cause.
    #[error("Pipeline failure: {message}")]
    Pipeline {
        /// Description of the failed step.
        message: String,
        /// The original cause.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
    },
}

impl Error {
    /// Returns the reporting category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidFormat(_)
            | Error::InvalidEntryName { .. }
            | Error::DuplicateEntry { .. }
            | Error::UnsupportedEntryType { .. }
            | Error::PathDescriptorTooShort { .. }
            | Error::MissingSeparator { .. }
            | Error::InvalidPathDescriptor { .. } => ErrorKind::Format,
            Error::Io(_) | Error::Staging { .. } | Error::Output { .. } => ErrorKind::Io,
            Error::InvalidCategory { .. }
            | Error::EntryCountMismatch { .. }
            | Error::StagingConflict { .. }
            | Error::OutputIsSource { .. }
            | Error::Cancelled
            | Error::Pipeline { .. } => ErrorKind::Pipeline,
        }
    }

    /// Returns `true` if the source package is malformed.
    pub fn is_format(&self) -> bool {
        self.kind() == ErrorKind::Format
    }

    /// Returns `true` if a file system operation failed.
    pub fn is_io(&self) -> bool {
        self.kind() == ErrorKind::Io
    }

    /// Returns the archive entry name associated with this error, if any.
    pub fn entry_name(&self) -> Option<&str> {
        match self {
            Error::InvalidEntryName { name, .. } => Some(name.as_str()),
            Error::DuplicateEntry { name, .. } => Some(name.as_str()),
            Error::UnsupportedEntryType { name, .. } => Some(name.as_str()),
            Error::PathDescriptorTooShort { entry, .. } => Some(entry.as_str()),
            Error::MissingSeparator { entry } => Some(entry.as_str()),
            Error::InvalidPathDescriptor { entry, .. } => Some(entry.as_str()),
            _ => None,
        }
    }

    /// Creates a Staging error.
    pub fn staging(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Error::Staging {
            path: path.into(),
            source,
        }
    }

    /// Creates an Output error.
    pub fn output(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Error::Output {
            path: path.into(),
            source,
        }
    }

    /// Wraps an arbitrary fault as a Pipeline error.
    pub fn pipeline(
        message: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync + 'static>>,
    ) -> Self {
        Error::Pipeline {
            message: message.into(),
            source: source.into(),
        }
    }
}

/// A specialized Result type for relocation operations.
pub type Result<T> = std::result::Result<T, Error>;
