//! Async entry points for the relocation pipeline.
//!
//! The pipeline is synchronous file I/O from start to finish; these helpers
//! run it on tokio's blocking pool so async callers stay responsive.
//! Progress is relayed through any `Send` sink, typically an
//! `Arc<AtomicProgress>` polled from the async side.
//!
//! # Example
//!
//! ```rust,no_run
//! use assetshift::async_relocate::relocate_async;
//! use assetshift::{AtomicProgress, RelocateOptions, RelocateRequest};
//!
//! # async fn run() {
//! let progress = AtomicProgress::shared();
//! let request = RelocateRequest::new("Hat.unitypackage", "Clothing", "Author", "Hat");
//! let relocation = relocate_async(request, RelocateOptions::new(), progress.clone()).await;
//! println!("{} ({}%)", relocation.path.display(), progress.percent());
//! # }
//! ```

use crate::pipeline::{Phase, Relocation, RelocateOptions, RelocateRequest, Relocator};
use crate::progress::ProgressSink;
use crate::{Error, Result};

/// Relocates a package on the blocking pool.
///
/// Like [`Relocator::relocate`] this never fails: a task that panics or is
/// cancelled by the runtime also yields a fallback to the source package.
pub async fn relocate_async<P>(request: RelocateRequest, options: RelocateOptions, mut progress: P) -> Relocation
where
    P: ProgressSink + 'static,
{
    let source = request.source.clone();
    let task = tokio::task::spawn_blocking(move || {
        Relocator::new(options).relocate(&request, &mut progress)
    });

    match task.await {
        Ok(relocation) => relocation,
        Err(e) => Relocation::fallback(
            &source,
            Phase::Idle,
            Error::pipeline("relocation task failed", e),
        ),
    }
}

/// Relocates a package on the blocking pool, returning errors.
pub async fn try_relocate_async<P>(
    request: RelocateRequest,
    options: RelocateOptions,
    mut progress: P,
) -> Result<std::path::PathBuf>
where
    P: ProgressSink + 'static,
{
    tokio::task::spawn_blocking(move || {
        Relocator::new(options).try_relocate(&request, &mut progress)
    })
    .await
    .map_err(|e| Error::pipeline("relocation task failed", e))?
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::AtomicProgress;
    use crate::test_util::{TestEntry, package_bytes};
    use std::fs;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_relocate_async() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("hat.unitypackage");
        fs::write(
            &source,
            package_bytes(&[TestEntry::File("abc/pathname", b"Assets/Hat.prefab")]),
        )
        .unwrap();

        let progress = AtomicProgress::shared();
        let request = RelocateRequest::new(&source, "Clothing", "Author", "Hat");
        let options = RelocateOptions::new().work_dir(temp.path().join("work"));

        let relocation = relocate_async(request, options, progress.clone()).await;
        assert!(relocation.is_relocated());
        assert_eq!(progress.percent(), 100);
        assert_eq!(progress.label(), "Finalizing");
    }

    #[tokio::test]
    async fn test_try_relocate_async_error() {
        let temp = TempDir::new().unwrap();
        let request = RelocateRequest::new(temp.path().join("missing"), "Clothing", "A", "T");
        let options = RelocateOptions::new().work_dir(temp.path().join("work"));

        let err = try_relocate_async(request, options, crate::NoProgress)
            .await
            .unwrap_err();
        assert!(err.is_io());
    }
}
