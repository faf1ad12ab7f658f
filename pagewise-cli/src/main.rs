//! Pagewise CLI - Inspect chapter catalogs and reading progress from JSON dumps

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Parse a scroll offset (a non-negative number of pixels)
fn parse_offset(s: &str) -> Result<u32, String> {
    s.trim()
        .parse()
        .map_err(|_| format!("'{}' is not a valid scroll offset", s))
}

#[derive(Parser)]
#[command(name = "pagewise")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build and list the chapter catalog of a manifest
    Catalog {
        /// Chapter manifest JSON file
        manifest: PathBuf,

        /// Table of contents JSON file
        #[arg(long)]
        toc: Option<PathBuf>,

        /// Heuristic rules JSON file
        #[arg(long)]
        rules: Option<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the chapter a reader would open first
    Initial {
        /// Chapter manifest JSON file
        manifest: PathBuf,

        /// Table of contents JSON file
        #[arg(long)]
        toc: Option<PathBuf>,

        /// Bookmarked chapter to resume from
        #[arg(long)]
        resume: Option<String>,

        /// Heuristic rules JSON file
        #[arg(long)]
        rules: Option<PathBuf>,
    },

    /// Show the next (or previous) navigable chapter
    Step {
        /// Chapter manifest JSON file
        manifest: PathBuf,

        /// Chapter to step from
        #[arg(long)]
        from: String,

        /// Step backwards
        #[arg(long)]
        back: bool,

        /// Table of contents JSON file
        #[arg(long)]
        toc: Option<PathBuf>,

        /// Heuristic rules JSON file
        #[arg(long)]
        rules: Option<PathBuf>,
    },

    /// Print the normalized form of chapter keys
    Normalize {
        /// Chapter ids or hrefs
        #[arg(required = true)]
        keys: Vec<String>,
    },

    /// Read or write a cached scroll offset
    Offset {
        /// Offset cache JSON file
        #[arg(long)]
        cache: PathBuf,

        /// Book id
        book: String,

        /// Chapter key
        chapter: String,

        /// Store this offset instead of reading
        #[arg(long, value_parser = parse_offset)]
        set: Option<u32>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose {
        "pagewise_cli=debug,pagewise_core=debug"
    } else {
        "pagewise_cli=info"
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(filter))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match cli.command {
        Commands::Catalog {
            manifest,
            toc,
            rules,
            json,
        } => commands::catalog(&manifest, toc.as_deref(), rules.as_deref(), json),

        Commands::Initial {
            manifest,
            toc,
            resume,
            rules,
        } => commands::initial(
            &manifest,
            toc.as_deref(),
            resume.as_deref(),
            rules.as_deref(),
        ),

        Commands::Step {
            manifest,
            from,
            back,
            toc,
            rules,
        } => commands::step(&manifest, &from, back, toc.as_deref(), rules.as_deref()),

        Commands::Normalize { keys } => commands::normalize(&keys),

        Commands::Offset {
            cache,
            book,
            chapter,
            set,
        } => commands::offset(&cache, &book, &chapter, set).await,
    }
}
