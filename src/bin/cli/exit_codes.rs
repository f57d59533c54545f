//! Exit codes for the CLI tool.

use assetshift::{Error, ErrorKind};

/// Exit code constants
pub const SUCCESS: i32 = 0;
/// Relocation fell back to the source package
pub const FALLBACK: i32 = 1;
/// Package format error
pub const BAD_ARCHIVE: i32 = 3;
/// I/O error
pub const IO_ERROR: i32 = 5;
/// Ctrl+C (128 + SIGINT)
pub const USER_INTERRUPT: i32 = 130;
/// Invalid command line arguments
pub const BAD_ARGS: i32 = 255;

/// Exit code enum for structured handling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    Success,
    Fallback,
    BadArchive,
    IoError,
    UserInterrupt,
    BadArgs,
}

impl ExitCode {
    /// Returns the numeric exit code
    pub fn code(self) -> i32 {
        match self {
            Self::Success => SUCCESS,
            Self::Fallback => FALLBACK,
            Self::BadArchive => BAD_ARCHIVE,
            Self::IoError => IO_ERROR,
            Self::UserInterrupt => USER_INTERRUPT,
            Self::BadArgs => BAD_ARGS,
        }
    }
}

/// Converts an assetshift error to an exit code
pub fn error_to_exit_code(error: &Error) -> ExitCode {
    match error {
        Error::Cancelled => ExitCode::UserInterrupt,
        Error::InvalidCategory { .. } => ExitCode::BadArgs,
        _ => match error.kind() {
            ErrorKind::Format => ExitCode::BadArchive,
            ErrorKind::Io => ExitCode::IoError,
            ErrorKind::Pipeline => ExitCode::Fallback,
        },
    }
}
