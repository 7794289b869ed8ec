mod clear;
mod index;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "tagscope",
    version,
    about = "A language server for source navigation backed by GNU Global tag databases",
    long_about = "Tagscope delegates symbol indexing to the GNU Global toolchain (gtags/global) \
                  and serves definition lookup, reference search and symbol search over the \
                  Language Server Protocol. Tag databases are kept per project under a shared \
                  cache directory and reused across sessions."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the Language Server Protocol (LSP) server
    #[command(
        long_about = "Serves LSP over stdio by default, or over a local TCP connection with --tcp. \
                      The tag database is checked, repaired or built when the client initializes."
    )]
    Lsp {
        /// Listen on TCP instead of stdio
        #[arg(long)]
        tcp: bool,
        /// TCP port to listen on (with --tcp)
        #[arg(long, default_value_t = 9528)]
        port: u16,
    },
    /// Build (or rebuild) the tag database for a project
    Index {
        /// Path to the project root directory to index
        #[arg(value_name = "PROJECT_PATH")]
        path: PathBuf,
    },
    /// Remove cached tag databases
    #[command(
        long_about = "Removes cached tag databases. If a path is provided, only that project's \
                      database is removed. Otherwise, the whole cache root is cleared."
    )]
    Clear {
        /// Path to the project root directory to clear (optional)
        #[arg(value_name = "PROJECT_PATH")]
        path: Option<PathBuf>,
    },
}

pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let (component, to_stderr) = match &cli.command {
        Commands::Lsp { .. } => ("lsp", false),
        _ => ("cli", true),
    };
    let _guard = tagscope_core::logging::init_logging(component, to_stderr);

    let rt = tokio::runtime::Runtime::new()?;

    match cli.command {
        Commands::Lsp { tcp: true, port } => {
            rt.block_on(tagscope_lsp::run_tcp(port))?;
            Ok(())
        }
        Commands::Lsp { tcp: false, .. } => {
            rt.block_on(tagscope_lsp::run_stdio());
            Ok(())
        }
        Commands::Index { path } => rt.block_on(index::run(path)),
        Commands::Clear { path } => clear::run(path),
    }
}
