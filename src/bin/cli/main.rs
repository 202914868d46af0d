//! CLI tool for chunked ZIP archiving.

mod commands;
mod exit_codes;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use exit_codes::ExitCode;

/// Append large files to ZIP archives in bounded-size chunks
#[derive(Parser)]
#[command(name = "chunkzip")]
#[command(author, version, about = "Append large files to ZIP archives in bounded-size chunks", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Suppress normal output
    #[arg(long, short = 'q', global = true)]
    quiet: bool,

    /// Log progress to stderr (repeat for more detail)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Append a file to an archive, creating the archive if needed (alias: a)
    #[command(alias = "a")]
    Add {
        /// File to add
        source: PathBuf,

        /// Archive to append to
        archive: PathBuf,

        /// Compression method
        #[arg(short = 'm', long, value_enum, default_value = "deflate")]
        method: Method,

        /// Chunk size in bytes
        #[arg(short = 'c', long, default_value_t = chunkzip::DEFAULT_CHUNK_SIZE)]
        chunk_size: usize,

        /// Compression level (0-9, default depends on method)
        #[arg(short = 'l', long)]
        level: Option<u32>,
    },

    /// List archive contents (alias: l)
    #[command(alias = "l")]
    List {
        /// Archive file to list
        archive: PathBuf,

        /// Show technical details
        #[arg(long)]
        technical: bool,
    },

    /// Test archive integrity (alias: t)
    #[command(alias = "t")]
    Test {
        /// Archive file to test
        archive: PathBuf,
    },
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum Method {
    Stored,
    Deflate,
    Bzip2,
    Lzma,
}

impl From<Method> for chunkzip::CompressionMethod {
    fn from(method: Method) -> Self {
        match method {
            Method::Stored => chunkzip::CompressionMethod::Stored,
            Method::Deflate => chunkzip::CompressionMethod::Deflate,
            Method::Bzip2 => chunkzip::CompressionMethod::Bzip2,
            Method::Lzma => chunkzip::CompressionMethod::Lzma,
        }
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    env_logger::Builder::from_default_env()
        .filter_level(level)
        .format_timestamp(None)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let exit_code = match cli.command {
        Commands::Add {
            source,
            archive,
            method,
            chunk_size,
            level,
        } => commands::add(&commands::AddConfig {
            source: &source,
            archive_path: &archive,
            method,
            chunk_size,
            level,
            quiet: cli.quiet,
        }),

        Commands::List { archive, technical } => commands::list(&archive, technical),

        Commands::Test { archive } => commands::test(&archive, cli.quiet),
    };

    std::process::exit(exit_code.code());
}
