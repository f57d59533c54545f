//! CLI tool for relocating Unity packages.

mod commands;
mod exit_codes;
mod output;
mod progress;

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{Shell, generate};

use exit_codes::ExitCode;

/// Relocate Unity package assets under a category folder
#[derive(Parser)]
#[command(name = "assetshift")]
#[command(author, version, about = "Relocate Unity package assets under a category folder", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, short = 'f', value_enum, default_value = "human", global = true)]
    format: OutputFormat,

    /// Suppress progress output
    #[arg(long, short = 'q', global = true)]
    quiet: bool,

    /// Log pipeline phases (RUST_LOG takes precedence)
    #[arg(long, short = 'v', global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Relocate a package's assets into a category folder (alias: r)
    #[command(alias = "r")]
    Relocate {
        /// Package to relocate
        archive: PathBuf,

        /// Category folder inserted after `Assets/`
        #[arg(short = 'c', long)]
        category: String,

        /// Item author, part of the staging key
        #[arg(short = 'a', long, default_value = "")]
        author: String,

        /// Item title, part of the staging key (defaults to the file stem)
        #[arg(short = 't', long)]
        title: Option<String>,

        /// Work directory for staging (defaults to <temp>/assetshift)
        #[arg(short = 'w', long, env = "ASSETSHIFT_WORK_DIR")]
        work_dir: Option<PathBuf>,

        /// Directory receiving the rebuilt package (defaults to the work dir)
        #[arg(short = 'o', long)]
        output_dir: Option<PathBuf>,

        /// Insert after the first `/` instead of at a fixed offset
        #[arg(long)]
        after_first_separator: bool,

        /// gzip-compress the rebuilt package
        #[arg(long)]
        gzip_output: bool,

        /// Use a unique staging directory for this run
        #[arg(long)]
        unique_staging: bool,
    },

    /// List the assets of a package (alias: l)
    #[command(alias = "l")]
    List {
        /// Package to list
        archive: PathBuf,

        /// Preview destinations after relocation into this category
        #[arg(short = 'c', long)]
        category: Option<String>,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Human,
    Json,
}

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp_millis()
        .init();

    // First Ctrl+C asks the running job to stop, the second one exits
    let cancel = Arc::new(AtomicBool::new(false));
    let handler_flag = Arc::clone(&cancel);
    ctrlc::set_handler(move || {
        if handler_flag.swap(true, Ordering::SeqCst) {
            eprintln!("\nInterrupted");
            std::process::exit(exit_codes::USER_INTERRUPT);
        }
        eprintln!("\nCancelling...");
    })
    .ok();

    let exit_code = match cli.command {
        Commands::Relocate {
            archive,
            category,
            author,
            title,
            work_dir,
            output_dir,
            after_first_separator,
            gzip_output,
            unique_staging,
        } => commands::relocate(&commands::RelocateConfig {
            archive_path: &archive,
            category: &category,
            author: &author,
            title: title.as_deref(),
            work_dir: work_dir.as_deref(),
            output_dir: output_dir.as_deref(),
            after_first_separator,
            gzip_output,
            unique_staging,
            format: cli.format,
            quiet: cli.quiet,
            cancel,
        }),

        Commands::List { archive, category } => {
            commands::list(&archive, category.as_deref(), cli.format)
        }

        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            generate(shell, &mut cmd, name, &mut std::io::stdout());
            ExitCode::Success
        }
    };

    std::process::exit(exit_code.code());
}
