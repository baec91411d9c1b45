//! Orgtree CLI entry point

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(name = "orgtree")]
#[command(about = "Build and query government organization-structure snapshots", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Working root; the snapshot cache lives in `<root>/.orgtree`
    #[arg(short, long, default_value = ".", global = true)]
    root: PathBuf,

    /// Build configuration (defaults to `<root>/orgtree.toml`)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Neither read nor write the snapshot cache
    #[arg(long, global = true)]
    no_cache: bool,

    /// Keep every administration type, not only the central administration
    #[arg(long, global = true)]
    all: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Build snapshots for one or more structure files
    Build {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// List the root and its jurisdictions
    Jurisdictions { file: PathBuf },
    /// Print the path from the root to a node
    Path {
        file: PathBuf,
        /// Node identifier, or a ` -> `-joined name path
        target: String,
    },
    /// List a node and everything below it
    Descendants {
        file: PathBuf,
        /// Node identifier, or a ` -> `-joined name path
        target: String,
    },
    /// Write one row per node to stdout
    Flatten {
        file: PathBuf,

        #[arg(short, long, value_enum, default_value_t = OutputFormat::Csv)]
        format: OutputFormat,
    },
    /// Clear the snapshot cache
    Clear,
    /// Show version
    Version,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Csv,
    Json,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(format!(
            "orgtree={log_level},orgtree_core={log_level}"
        )))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    tracing::debug!("Orgtree v{}", env!("CARGO_PKG_VERSION"));

    let central_only = !cli.all;
    let session = || {
        let config_path = cli.config.clone().unwrap_or_else(|| cli.root.join("orgtree.toml"));
        commands::Session::open(&cli.root, &config_path, !cli.no_cache)
    };

    match cli.command {
        Commands::Build { ref files } => commands::build(&session()?, files, central_only),
        Commands::Jurisdictions { ref file } => {
            commands::jurisdictions(&session()?, file, central_only)
        }
        Commands::Path { ref file, ref target } => {
            commands::path(&session()?, file, target, central_only)
        }
        Commands::Descendants { ref file, ref target } => {
            commands::descendants(&session()?, file, target, central_only)
        }
        Commands::Flatten { ref file, format } => {
            commands::flatten(&session()?, file, format, central_only)
        }
        Commands::Clear => commands::clear(&cli.root),
        Commands::Version => {
            println!("Orgtree v{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}
