//! Command implementations for the CLI tool.

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use assetshift::{
    Category, InsertionPoint, OutputCompression, PathPatcher, RelocateOptions, RelocateRequest,
    Relocator, inspect,
};

use crate::OutputFormat;
use crate::exit_codes::{ExitCode, error_to_exit_code};
use crate::output::create_formatter;
use crate::progress::CliProgress;

/// Configuration for the relocate command.
pub struct RelocateConfig<'a> {
    pub archive_path: &'a Path,
    pub category: &'a str,
    pub author: &'a str,
    pub title: Option<&'a str>,
    pub work_dir: Option<&'a Path>,
    pub output_dir: Option<&'a Path>,
    pub after_first_separator: bool,
    pub gzip_output: bool,
    pub unique_staging: bool,
    pub format: OutputFormat,
    pub quiet: bool,
    pub cancel: Arc<AtomicBool>,
}

impl RelocateConfig<'_> {
    fn options(&self) -> RelocateOptions {
        let mut options = RelocateOptions::new().unique_staging(self.unique_staging);
        if let Some(dir) = self.work_dir {
            options = options.work_dir(dir);
        }
        if let Some(dir) = self.output_dir {
            options = options.output_dir(dir);
        }
        if self.after_first_separator {
            options = options.insertion(InsertionPoint::AfterFirstSeparator);
        }
        if self.gzip_output {
            options = options.output_compression(OutputCompression::Gzip);
        }
        options
    }

    fn title(&self) -> String {
        match self.title {
            Some(title) => title.to_string(),
            None => self
                .archive_path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default(),
        }
    }
}

/// Relocate command implementation
pub fn relocate(config: &RelocateConfig<'_>) -> ExitCode {
    let formatter = create_formatter(config.format);

    // Reject bad labels before any file is touched
    if let Err(e) = Category::new(config.category) {
        eprintln!("Error: {}", e);
        return ExitCode::BadArgs;
    }

    let relocator = Relocator::new(config.options());
    let request = RelocateRequest::new(
        config.archive_path,
        config.category,
        config.author,
        config.title(),
    );

    let quiet = config.quiet || config.format == OutputFormat::Json;
    let mut progress = CliProgress::new(quiet, Arc::clone(&config.cancel));
    let relocation = relocator.relocate(&request, &mut progress);

    match &relocation.error {
        None => {
            progress.finish();
            println!("{}", formatter.format_relocation(&relocation));
            ExitCode::Success
        }
        Some(error) => {
            progress.abandon("Failed");
            println!("{}", formatter.format_relocation(&relocation));
            error_to_exit_code(error)
        }
    }
}

/// List command implementation
pub fn list(archive_path: &Path, category: Option<&str>, format: OutputFormat) -> ExitCode {
    let formatter = create_formatter(format);

    let patcher = match category.map(Category::new).transpose() {
        Ok(category) => category.map(|c| PathPatcher::new(&c)),
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::BadArgs;
        }
    };

    match inspect(archive_path) {
        Ok(listing) => {
            println!("{}", formatter.format_listing(&listing, patcher.as_ref()));
            ExitCode::Success
        }
        Err(e) => {
            eprintln!("Error reading '{}': {}", archive_path.display(), e);
            error_to_exit_code(&e)
        }
    }
}
