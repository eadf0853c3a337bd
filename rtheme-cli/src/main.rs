//! rtheme CLI - import and resynchronize remote themes by hand

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use rtheme_core::Config;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use commands::{ImportArgs, ListArgs, ResyncArgs, ShowArgs};

/// rtheme: themes imported from git repositories
#[derive(Parser, Debug)]
#[command(name = "rtheme")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to git executable (overrides config and env)
    #[arg(long, global = true, env = "RTHEME_GIT_PATH")]
    git_path: Option<String>,

    /// Path to the theme database (overrides config and env)
    #[arg(long, global = true, env = "RTHEME_DB_PATH")]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show version information
    Version,

    /// Import a theme from a git repository
    #[command(visible_alias = "i")]
    Import(ImportArgs),

    /// Re-fetch remote themes and update their fields
    #[command(visible_alias = "sync")]
    Resync(ResyncArgs),

    /// Show one theme and its fields
    Show(ShowArgs),

    /// List stored themes
    #[command(visible_alias = "ls")]
    List(ListArgs),

    /// Show current configuration
    Config,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    // Load configuration with overrides
    let config = Config::load_with_overrides(cli.git_path.clone(), cli.db.clone())?;

    tracing::debug!(
        git_path = %config.fetch.git_path,
        timeout = ?config.fetch.timeout,
        "Configuration loaded"
    );

    match cli.command {
        Some(Commands::Version) => {
            println!("rtheme {}", env!("CARGO_PKG_VERSION"));
        }
        Some(Commands::Import(args)) => {
            args.execute(&config).await?;
        }
        Some(Commands::Resync(args)) => {
            args.execute(&config).await?;
        }
        Some(Commands::Show(args)) => {
            args.execute(&config)?;
        }
        Some(Commands::List(args)) => {
            args.execute(&config)?;
        }
        Some(Commands::Config) => {
            println!("rtheme Configuration");
            println!("====================");
            println!();
            println!("Fetch Settings:");
            println!("  git_path: {}", config.fetch.git_path);
            println!("  timeout: {:?}", config.fetch.timeout);
            println!("  scratch_root: {}", config.fetch.scratch_root().display());
            println!();
            println!("Store Settings:");
            match config.store.path() {
                Ok(path) => println!("  path: {}", path.display()),
                Err(e) => println!("  path: ({})", e),
            }
            println!();
            if let Some(path) = Config::default_config_path() {
                println!("Config file: {}", path.display());
                if path.exists() {
                    println!("  (exists)");
                } else {
                    println!("  (not found - using defaults)");
                }
            }
        }
        None => {
            println!("rtheme - themes imported from git repositories");
            println!();
            println!("Use --help for usage information");
        }
    }

    Ok(())
}
