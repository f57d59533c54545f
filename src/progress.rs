//! Progress reporting for relocation jobs.
//!
//! The pipeline reports `(percent, label)` pairs through a [`ProgressSink`]:
//!
//! | Phase | Percent |
//! |-------|---------|
//! | Staging prepared | 0 |
//! | Entries counted | 10 |
//! | Extracting | `10 + 80 * processed / total` |
//! | Archive built | 90 |
//! | Finalized | 100 |
//!
//! Values are non-decreasing and 100 is only reported on success.
//!
//! # Example
//!
//! ```rust,no_run
//! use assetshift::progress::RecordingProgress;
//! use assetshift::relocate;
//!
//! let mut progress = RecordingProgress::new();
//! let result = relocate("package.unitypackage", "Clothing", "Author", "Title", &mut progress);
//! println!("{} updates, last: {:?}", progress.updates().len(), progress.last());
//! # let _ = result;
//! ```

use std::sync::atomic::{AtomicBool, AtomicU8, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

/// Receiver of progress updates.
///
/// Implementations must be `Send` so a job can run on another thread.
pub trait ProgressSink: Send {
    /// Called with the overall percentage (0..=100) and a phase label.
    fn on_progress(&mut self, percent: u8, label: &str);

    /// Called before each entry of the processing pass is handled.
    fn on_entry(&mut self, name: &str) {
        let _ = name;
    }

    /// Checks if cancellation has been requested.
    ///
    /// Polled at phase boundaries and between entries. Returning `true`
    /// aborts the job through the fallback path.
    ///
    /// Default implementation returns `false` (no cancellation).
    fn should_cancel(&self) -> bool {
        false
    }
}

impl<S: ProgressSink + ?Sized> ProgressSink for &mut S {
    fn on_progress(&mut self, percent: u8, label: &str) {
        (**self).on_progress(percent, label);
    }

    fn on_entry(&mut self, name: &str) {
        (**self).on_entry(name);
    }

    fn should_cancel(&self) -> bool {
        (**self).should_cancel()
    }
}

impl<S: ProgressSink + ?Sized> ProgressSink for Box<S> {
    fn on_progress(&mut self, percent: u8, label: &str) {
        (**self).on_progress(percent, label);
    }

    fn on_entry(&mut self, name: &str) {
        (**self).on_entry(name);
    }

    fn should_cancel(&self) -> bool {
        (**self).should_cancel()
    }
}

/// A sink that ignores every update (null object pattern).
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn on_progress(&mut self, _percent: u8, _label: &str) {}
}

/// A sink that records every update, mostly useful in tests.
#[derive(Debug, Default, Clone)]
pub struct RecordingProgress {
    updates: Vec<(u8, String)>,
    entries: Vec<String>,
    cancel_after: Option<usize>,
}

impl RecordingProgress {
    /// Creates an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation once `updates` progress updates were received.
    pub fn cancel_after(mut self, updates: usize) -> Self {
        self.cancel_after = Some(updates);
        self
    }

    /// Returns all recorded `(percent, label)` updates in order.
    pub fn updates(&self) -> &[(u8, String)] {
        &self.updates
    }

    /// Returns the recorded percentages in order.
    pub fn percents(&self) -> Vec<u8> {
        self.updates.iter().map(|(p, _)| *p).collect()
    }

    /// Returns the last update, if any.
    pub fn last(&self) -> Option<(u8, &str)> {
        self.updates.last().map(|(p, l)| (*p, l.as_str()))
    }

    /// Returns the entry names announced during the processing pass.
    pub fn entries(&self) -> &[String] {
        &self.entries
    }
}

impl ProgressSink for RecordingProgress {
    fn on_progress(&mut self, percent: u8, label: &str) {
        self.updates.push((percent, label.to_string()));
    }

    fn on_entry(&mut self, name: &str) {
        self.entries.push(name.to_string());
    }

    fn should_cancel(&self) -> bool {
        self.cancel_after
            .is_some_and(|limit| self.updates.len() >= limit)
    }
}

/// A thread-safe sink using atomics.
///
/// Allows progress to be monitored, and cancellation requested, from another
/// thread.
#[derive(Debug)]
pub struct AtomicProgress {
    percent: AtomicU8,
    entries: AtomicU64,
    label: Mutex<String>,
    cancelled: AtomicBool,
}

impl Default for AtomicProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl AtomicProgress {
    /// Creates a new atomic sink.
    pub fn new() -> Self {
        Self {
            percent: AtomicU8::new(0),
            entries: AtomicU64::new(0),
            label: Mutex::new(String::new()),
            cancelled: AtomicBool::new(false),
        }
    }

    /// Creates a shared atomic sink.
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Returns the last reported percentage.
    pub fn percent(&self) -> u8 {
        self.percent.load(Ordering::Relaxed)
    }

    /// Returns the last reported phase label.
    pub fn label(&self) -> String {
        self.label
            .lock()
            .map(|label| label.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }

    /// Returns the number of entries announced so far.
    pub fn entries(&self) -> u64 {
        self.entries.load(Ordering::Relaxed)
    }

    /// Returns whether cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }

    /// Requests cancellation.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    fn record(&self, percent: u8, label: &str) {
        self.percent.store(percent, Ordering::Relaxed);
        let mut current = self
            .label
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        current.clear();
        current.push_str(label);
    }
}

impl ProgressSink for AtomicProgress {
    fn on_progress(&mut self, percent: u8, label: &str) {
        self.record(percent, label);
    }

    fn on_entry(&mut self, _name: &str) {
        self.entries.fetch_add(1, Ordering::Relaxed);
    }

    fn should_cancel(&self) -> bool {
        self.is_cancelled()
    }
}

/// Sink for a shared `Arc<AtomicProgress>`.
impl ProgressSink for Arc<AtomicProgress> {
    fn on_progress(&mut self, percent: u8, label: &str) {
        self.record(percent, label);
    }

    fn on_entry(&mut self, _name: &str) {
        self.entries.fetch_add(1, Ordering::Relaxed);
    }

    fn should_cancel(&self) -> bool {
        self.is_cancelled()
    }
}

/// A sink that calls a closure.
pub struct ClosureProgress<F> {
    callback: F,
}

impl<F> ClosureProgress<F>
where
    F: FnMut(u8, &str) + Send,
{
    /// Creates a sink from a closure receiving `(percent, label)`.
    pub fn new(callback: F) -> Self {
        Self { callback }
    }
}

impl<F> ProgressSink for ClosureProgress<F>
where
    F: FnMut(u8, &str) + Send,
{
    fn on_progress(&mut self, percent: u8, label: &str) {
        (self.callback)(percent, label);
    }
}

/// Creates a closure-based sink.
pub fn progress_fn<F>(f: F) -> ClosureProgress<F>
where
    F: FnMut(u8, &str) + Send,
{
    ClosureProgress::new(f)
}
