//! gitpuller CLI - keep local clones in step with their GitHub remotes
//!
//! Lists every repository and branch the token can see, matches them to
//! configured local clones, and pulls each one with local changes stashed
//! around the pull.

mod commands;

use clap::{Parser, Subcommand};
use gitpuller_core::{Config, Secrets};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use commands::{PathsArgs, ReposArgs, SyncArgs, TokenArgs};

/// gitpuller: pull every GitHub branch you have cloned locally
#[derive(Parser, Debug)]
#[command(name = "gitpuller")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Maximum simultaneous pulls and API calls (overrides config and env)
    #[arg(short = 'j', long, global = true, env = "GITPULLER_CONCURRENCY")]
    concurrency: Option<usize>,

    /// Timeout for each git command in seconds (overrides config and env)
    #[arg(long, global = true, env = "GITPULLER_TIMEOUT_SECS")]
    timeout_secs: Option<u64>,

    /// Remote to pull from (overrides config and env)
    #[arg(long, global = true, env = "GITPULLER_REMOTE")]
    remote: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show version information
    Version,

    /// Pull every remote branch that has a local clone
    #[command(visible_alias = "s")]
    Sync(SyncArgs),

    /// List remote repositories and branches
    Repos(ReposArgs),

    /// Manage local repository paths
    Paths(PathsArgs),

    /// Manage the GitHub access token
    Token(TokenArgs),

    /// Show current configuration
    Config,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so `--json` output stays parseable.
    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    if cli.verbose {
        tracing::info!("Verbose mode enabled");
    }

    // Load configuration with overrides
    let config = Config::load_with_overrides(cli.concurrency, cli.timeout_secs, cli.remote.clone())?;

    if cli.verbose {
        tracing::info!(
            concurrency = config.sync.concurrency,
            timeout = ?config.sync.command_timeout,
            remote = %config.sync.remote,
            paths = config.paths().len(),
            "Configuration loaded"
        );
    }

    match cli.command {
        Some(Commands::Version) => {
            println!("gitpuller {}", env!("CARGO_PKG_VERSION"));
        }
        Some(Commands::Sync(args)) => {
            args.execute(cli.verbose, &config).await?;
        }
        Some(Commands::Repos(args)) => {
            args.execute(&config).await?;
        }
        Some(Commands::Paths(args)) => {
            args.execute(&config.sync.remote).await?;
        }
        Some(Commands::Token(args)) => {
            args.execute(&config).await?;
        }
        Some(Commands::Config) => {
            print_config(&config)?;
        }
        None => {
            println!("gitpuller - pull every GitHub branch you have cloned locally");
            println!();
            println!("Use --help for usage information");
        }
    }

    Ok(())
}

fn print_config(config: &Config) -> anyhow::Result<()> {
    println!("gitpuller Configuration");
    println!("=======================");
    println!();
    println!("Sync Settings:");
    println!("  concurrency: {}", config.sync.concurrency);
    println!("  command_timeout: {:?}", config.sync.command_timeout);
    println!("  remote: {}", config.sync.remote);
    println!("  stash_message: {}", config.sync.stash_message);
    println!("  git_path: {}", config.sync.git_path);
    println!();
    println!("GitHub Settings:");
    println!(
        "  api_url: {}",
        config.github.api_url.as_deref().unwrap_or("(default)")
    );
    println!("  request_timeout: {:?}", config.github.request_timeout);
    println!("  per_page: {}", config.github.per_page);
    let token = if Secrets::load()?.github_token().is_some() {
        "configured"
    } else {
        "not configured"
    };
    println!("  token: {}", token);
    println!();
    println!("Repository Paths:");
    if config.paths().is_empty() {
        println!("  (none)");
    }
    for path in config.paths() {
        println!("  {}", path.display());
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

    Ok(())
}
