//! Command-line request binding

use anyhow::Result;
use app_core::{LogView, ViewOptions};
use app_fs::{decode_filename, FileType, SortBy};
use clap::{Parser, Subcommand};
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Configuration file
    #[arg(long, env = "LOGVIEW_CONFIG")]
    pub config: Option<PathBuf>,

    /// Directory to browse, overriding the configured log location
    #[arg(long, env = "LOGVIEW_PATH")]
    pub log_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List a folder or archive
    List {
        /// Folder or archive relative to the log directory
        #[arg(long)]
        base: Option<String>,

        /// size, modified or filename
        #[arg(long)]
        sort_by: Option<SortBy>,

        #[arg(long)]
        desc: bool,

        /// Print the listing as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print a file, or its last lines
    View {
        filename: String,

        /// Folder or archive relative to the log directory
        #[arg(long)]
        base: Option<String>,

        #[arg(long, allow_hyphen_values = true)]
        tail_lines: Option<i64>,

        /// Only tail lines containing this text
        #[arg(long, requires = "tail_lines")]
        search_text: Option<String>,
    },

    /// Print every line containing TERM across the log directory
    Search { term: String },
}

pub fn run(view: &LogView, command: Command) -> Result<()> {
    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());

    execute(view, command, &mut out)?;
    out.flush()?;
    Ok(())
}

/// Serve one request, writing its response to `out`.
///
/// `filename` and `base` arrive percent-encoded, the way listings hand them
/// out; plain names pass through unchanged.
fn execute(view: &LogView, command: Command, out: &mut dyn Write) -> Result<()> {
    match command {
        Command::List {
            base,
            sort_by,
            desc,
            json,
        } => {
            let base = base.as_deref().map(decode_filename);
            let listing = view.list(base.as_deref(), sort_by, desc)?;
            if json {
                serde_json::to_writer_pretty(&mut *out, &listing)?;
                writeln!(out)?;
            } else {
                writeln!(out, "{}", listing.current_folder)?;
                for file in &listing.files {
                    let marker = match file.file_type() {
                        FileType::Directory => "d",
                        FileType::Archive => "a",
                        FileType::File => "-",
                    };
                    writeln!(
                        out,
                        "{} {:>12} {:>15} {}",
                        marker,
                        file.size(),
                        file.modified(),
                        file.display_filename()
                    )?;
                }
            }
        }
        Command::View {
            filename,
            base,
            tail_lines,
            search_text,
        } => {
            let base = base.as_deref().map(decode_filename);
            let options = ViewOptions {
                base: base.as_deref(),
                tail_lines,
                search_text: search_text.as_deref(),
            };
            view.view(&decode_filename(&filename), &options, out)?;
        }
        Command::Search { term } => {
            let matches = view.search(&term, out)?;
            tracing::info!(matches, "Search complete");
        }
    }

    Ok(())
}
