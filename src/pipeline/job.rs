//! The relocation state machine.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use super::{Phase, RelocateOptions, RelocateRequest};
use crate::build::{ArchiveBuilder, discard_partial, partial_path};
use crate::decode::ArchiveDecoder;
use crate::patch::{Category, PathPatcher};
use crate::progress::ProgressSink;
use crate::staging::{StagedEntry, StagingArea};
use crate::{Error, Result};

/// Percentage reported once the entries are counted.
const COUNTED_PERCENT: u8 = 10;
/// Span of the extraction phase.
const EXTRACT_SPAN: u64 = 80;
/// Percentage reported once the archive is built.
const BUILT_PERCENT: u8 = 90;
/// Percentage reported on success.
const DONE_PERCENT: u8 = 100;

/// State of one relocation, owned by a single invocation.
#[derive(Debug)]
pub struct RelocationJob {
    source: PathBuf,
    category: String,
    key: String,
    staging_dir: PathBuf,
    output: PathBuf,
    total_entries: usize,
    processed_entries: usize,
    phase: Phase,
    last_percent: Option<u8>,
}

impl RelocationJob {
    pub(crate) fn new(request: &RelocateRequest, options: &RelocateOptions) -> Self {
        let key = options.job_key(&request.author, &request.title);
        Self {
            source: request.source.clone(),
            category: request.category.clone(),
            staging_dir: options.staging_dir(&key),
            output: options.output_path(&key),
            key,
            total_entries: 0,
            processed_entries: 0,
            phase: Phase::Idle,
            last_percent: None,
        }
    }

    /// Returns the source package path.
    pub fn source(&self) -> &Path {
        &self.source
    }

    /// Returns the category label as requested.
    pub fn category(&self) -> &str {
        &self.category
    }

    /// Returns the staging key.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Returns the staging directory of this job.
    pub fn staging_dir(&self) -> &Path {
        &self.staging_dir
    }

    /// Returns the output package path.
    pub fn output(&self) -> &Path {
        &self.output
    }

    /// Returns the entry count from the counting pass.
    pub fn total_entries(&self) -> usize {
        self.total_entries
    }

    /// Returns the number of entries processed so far.
    pub fn processed_entries(&self) -> usize {
        self.processed_entries
    }

    /// Returns the current phase.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    fn enter(&mut self, phase: Phase) {
        debug_assert!(phase > self.phase, "{} -> {} is not forward", self.phase, phase);
        log::debug!("[{}] {} -> {}", self.key, self.phase, phase);
        self.phase = phase;
    }

    /// Reports `percent`, clamped so reported values never decrease.
    fn emit(&mut self, sink: &mut dyn ProgressSink, percent: u8) {
        let percent = self.last_percent.map_or(percent, |last| percent.max(last));
        self.last_percent = Some(percent);
        sink.on_progress(percent, self.phase.label());
    }

    fn extract_percent(&self) -> u8 {
        if self.total_entries == 0 {
            return COUNTED_PERCENT;
        }
        let processed = self.processed_entries.min(self.total_entries) as u64;
        let span = EXTRACT_SPAN * processed / self.total_entries as u64;
        COUNTED_PERCENT + span as u8
    }

    /// Runs the job to completion, returning the entry count.
    ///
    /// The staging directory is removed on every exit path.
    pub(crate) fn run(&mut self, options: &RelocateOptions, sink: &mut dyn ProgressSink) -> Result<usize> {
        self.enter(Phase::Staging);
        check_cancel(sink)?;
        let category = Category::new(&self.category)?;
        let patcher = PathPatcher::with_insertion(&category, options.insertion);
        if same_file(&self.source, &self.output) {
            return Err(Error::OutputIsSource {
                path: self.output.clone(),
            });
        }
        let staging = StagingArea::prepare(&self.staging_dir)?;
        self.emit(sink, 0);

        self.enter(Phase::CountingEntries);
        check_cancel(sink)?;
        self.total_entries = ArchiveDecoder::open(&self.source)?.count_entries()?;
        log::debug!("[{}] {} entries", self.key, self.total_entries);
        self.emit(sink, COUNTED_PERCENT);

        self.enter(Phase::Extracting);
        let staged = self.extract(&staging, &patcher, sink)?;

        self.enter(Phase::Building);
        check_cancel(sink)?;
        ArchiveBuilder::new()
            .compression(options.output_compression)
            .build(staging.root(), &staged, &self.output)?;
        self.emit(sink, BUILT_PERCENT);

        self.enter(Phase::Finalizing);
        if let Err(e) = staging.remove() {
            log::warn!("[{}] {}", self.key, e);
        }
        self.emit(sink, DONE_PERCENT);
        self.enter(Phase::Done);
        Ok(self.processed_entries)
    }

    fn extract(
        &mut self,
        staging: &StagingArea,
        patcher: &PathPatcher,
        sink: &mut dyn ProgressSink,
    ) -> Result<Vec<StagedEntry>> {
        let mut decoder = ArchiveDecoder::open(&self.source)?;
        let mut staged: Vec<StagedEntry> = Vec::with_capacity(self.total_entries);
        let mut seen: HashMap<PathBuf, usize> = HashMap::with_capacity(self.total_entries);

        for entry in decoder.entries()? {
            check_cancel(sink)?;
            let mut entry = entry?;
            sink.on_entry(entry.name.as_str());

            // Distinct names may still map to one staging path
            let target = entry.name.to_path_under(staging.root());
            if let Some(&index) = seen.get(&target) {
                return Err(Error::DuplicateEntry {
                    name: entry.name.to_string(),
                    previous: staged[index].name.to_string(),
                });
            }
            seen.insert(target, staged.len());

            if patcher.apply(&mut entry)? {
                log::debug!("[{}] patched '{}'", self.key, entry.name);
            }
            staged.push(staging.materialize(&entry)?);
            self.processed_entries += 1;
            let percent = self.extract_percent();
            self.emit(sink, percent);
        }
        decoder.finish()?;

        if self.processed_entries != self.total_entries {
            return Err(Error::EntryCountMismatch {
                expected: self.total_entries,
                actual: self.processed_entries,
            });
        }
        Ok(staged)
    }

    /// Marks the job aborted and removes whatever it left on disk.
    pub(crate) fn abort(&mut self) -> Phase {
        let failed = self.phase;
        self.enter(Phase::AbortedWithFallback);
        match fs::remove_dir_all(&self.staging_dir) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => log::warn!(
                "[{}] Failed to clean up staging directory '{}': {}",
                self.key,
                self.staging_dir.display(),
                e
            ),
        }
        discard_partial(&partial_path(&self.output));
        failed
    }
}

fn check_cancel(sink: &dyn ProgressSink) -> Result<()> {
    if sink.should_cancel() {
        Err(Error::Cancelled)
    } else {
        Ok(())
    }
}

/// Returns `true` if both paths name the same existing file.
fn same_file(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}
