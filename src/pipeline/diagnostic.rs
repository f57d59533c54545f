//! Failure diagnostics for aborted relocation jobs.

use std::fmt;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use super::Phase;
use crate::{Error, ErrorKind};

/// Record of a failed job, logged when the pipeline falls back.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    /// When the failure was observed.
    pub timestamp: SystemTime,
    /// The phase that failed.
    pub phase: Phase,
    /// Reporting category of the error.
    pub kind: ErrorKind,
    /// Top-level error message.
    pub message: String,
    /// Messages of the underlying causes, outermost first.
    pub causes: Vec<String>,
    /// The source package the job was working on.
    pub source: PathBuf,
}

impl Diagnostic {
    /// Captures an error raised during `phase`.
    pub fn capture(error: &Error, phase: Phase, source: impl Into<PathBuf>) -> Self {
        let mut causes = Vec::new();
        let mut cause = std::error::Error::source(error);
        while let Some(err) = cause {
            causes.push(err.to_string());
            cause = err.source();
        }

        Self {
            timestamp: SystemTime::now(),
            phase,
            kind: error.kind(),
            message: error.to_string(),
            causes,
            source: source.into(),
        }
    }

    /// Writes the diagnostic to the `log` facade at error level.
    pub fn log(&self) {
        log::error!("{}", self);
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let since_epoch = self
            .timestamp
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default();
        write!(
            f,
            "[{}.{:03}] {} during {} of '{}': {}",
            since_epoch.as_secs(),
            since_epoch.subsec_millis(),
            self.kind,
            self.phase,
            self.source.display(),
            self.message
        )?;
        for cause in &self.causes {
            write!(f, "\n  caused by: {}", cause)?;
        }
        Ok(())
    }
}
