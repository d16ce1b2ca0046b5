use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug, Clone)]
#[command(name = "sipkit", version, about = "Submission Information Package compiler")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Compile a signed, packaged Submission Information Package.
    Compile {
        /// Source data path.
        source_path: PathBuf,

        /// Output tar file (default: derived from the package identifier).
        #[arg(long)]
        tar_file: Option<PathBuf>,

        /// Directory for temporary metadata artifacts
        /// (default: a timestamp-named directory, removed afterwards).
        #[arg(long)]
        temp_path: Option<PathBuf>,

        /// Configuration file (default: user configuration directory).
        #[arg(long)]
        config: Option<PathBuf>,

        /// Check well-formedness of digital objects while scraping (default).
        #[arg(long, conflicts_with = "no_validation")]
        validation: bool,

        /// Skip the well-formedness check.
        #[arg(long)]
        no_validation: bool,
    },

    /// Clean temporary files from a working directory.
    Clean {
        /// Working directory to clean.
        temp_path: PathBuf,

        /// Also remove the directory itself when it ends up empty.
        #[arg(long)]
        delete_path: bool,
    },

    /// Scrape every file under a path and record well-formedness as JSON lines.
    Validate {
        /// Path to scan recursively.
        path: PathBuf,

        /// Output for well-formed file records.
        #[arg(long, default_value = "valid.jsonl")]
        valid_output: PathBuf,

        /// Output for files failing the check.
        #[arg(long, default_value = "invalid.jsonl")]
        invalid_output: PathBuf,

        /// Additionally write summary count records.
        #[arg(long)]
        summary: bool,

        /// Configuration file used for exclusion patterns.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Echo every record to stdout as well.
        #[arg(long)]
        stdout: bool,
    },
}
