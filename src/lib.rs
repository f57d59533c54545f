//! # assetshift
//!
//! Relocates the assets of a Unity package under a category folder.
//!
//! A Unity package is a gzip-compressed tar stream whose top-level entries
//! are GUID-named folders. Each folder normally holds a `pathname` text
//! descriptor with the asset's import destination, the `asset` payload and
//! an `asset.meta` sidecar. This crate rewrites every descriptor so the
//! destination gains an extra folder segment, then repackages the result
//! into a new, importable archive:
//!
//! ```text
//! Assets/MyAvatar.prefab  ->  Assets/Clothing/MyAvatar.prefab
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use assetshift::{NoProgress, relocate};
//!
//! let relocation = relocate("Avatar.unitypackage", "Clothing", "Author", "Avatar", &mut NoProgress);
//! // Either the rebuilt package or, if anything failed, the original one
//! println!("import {}", relocation.path.display());
//! ```
//!
//! ### Configuring the Pipeline
//!
//! ```rust,no_run
//! use assetshift::{
//!     InsertionPoint, OutputCompression, RecordingProgress, RelocateOptions, RelocateRequest,
//!     Relocator, Result,
//! };
//!
//! fn main() -> Result<()> {
//!     let relocator = Relocator::new(
//!         RelocateOptions::new()
//!             .work_dir("/var/tmp/assetshift")
//!             .output_dir("./relocated")
//!             .insertion(InsertionPoint::AfterFirstSeparator)
//!             .output_compression(OutputCompression::Gzip),
//!     );
//!     let request = RelocateRequest::new("Hat.unitypackage", "Clothing", "Author", "Hat");
//!
//!     let mut progress = RecordingProgress::new();
//!     let output = relocator.try_relocate(&request, &mut progress)?;
//!     println!("{} ({} progress updates)", output.display(), progress.updates().len());
//!     Ok(())
//! }
//! ```
//!
//! ### Inspecting a Package
//!
//! ```rust,no_run
//! use assetshift::inspect::inspect;
//!
//! let listing = inspect("Hat.unitypackage")?;
//! for asset in &listing.assets {
//!     println!("{} -> {:?}", asset.guid, asset.destination);
//! }
//! # Ok::<(), assetshift::Error>(())
//! ```
//!
//! ## Pipeline
//!
//! | Module | Role |
//! |--------|------|
//! | [`decode`] | Lazy, non-restartable entry sequence over the gzip+tar stream |
//! | [`patch`] | Inserts the category segment into `pathname` descriptors |
//! | [`staging`] | Per-job staging directory and entry materialization |
//! | [`build`] | Serializes the staged entries into the output package |
//! | [`pipeline`] | State machine, progress and fallback handling |
//!
//! ## Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `async` | [`async_relocate`] running the pipeline on Tokio's blocking pool |
//! | `cli` | The `assetshift` command-line tool |

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
#![forbid(unsafe_code)]

pub mod archive_path;
pub mod build;
pub mod decode;
pub mod entry;
pub mod error;
pub mod inspect;
pub mod patch;
pub mod pipeline;
pub mod progress;
pub mod staging;

#[cfg(feature = "async")]
#[cfg_attr(docsrs, doc(cfg(feature = "async")))]
pub mod async_relocate;

#[cfg(test)]
mod test_util;

pub use archive_path::EntryPath;
pub use build::{ArchiveBuilder, OutputCompression};
pub use decode::ArchiveDecoder;
pub use entry::{EntryKind, RawEntry};
pub use error::{Error, ErrorKind, Result};
pub use inspect::{AssetRecord, PackageListing, inspect};
pub use patch::{Category, InsertionPoint, PathPatcher};
pub use pipeline::{
    Diagnostic, Phase, RelocateOptions, RelocateRequest, Relocation, RelocationJob, Relocator,
    relocate, try_relocate,
};
pub use progress::{
    AtomicProgress, ClosureProgress, NoProgress, ProgressSink, RecordingProgress, progress_fn,
};
pub use staging::{StagedEntry, StagingArea, staging_key};

#[cfg(feature = "async")]
pub use async_relocate::{relocate_async, try_relocate_async};
