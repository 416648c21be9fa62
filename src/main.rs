//! lapo CLI - turn generated documentation patches into pull requests

mod cli;

use anstream::eprintln;
use clap::{Args, Parser, Subcommand};
use cli::context::GlobalOptions;
use cli::style::Stylize;
use cli::submit::SubmitOptions;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Turn generated documentation patches into GitHub pull requests
#[derive(Parser)]
#[command(name = "lapo", version, about, long_about = None)]
struct Cli {
    /// Config file (default: ~/.config/lapo/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Root directory for cached repositories
    #[arg(long, global = true)]
    cache_dir: Option<PathBuf>,

    /// Clone from <DIR>/<owner>/<repo>.git instead of the host
    #[arg(long, global = true, value_name = "DIR")]
    mirror_root: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Hide progress spinners
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the diff hunk of a pull request
    Diff {
        /// Pull request URL (https://github.com/<owner>/<repo>/pull/<number>)
        pr_url: String,
    },
    /// Apply a patch, push a branch and open a pull request
    Submit(SubmitArgs),
    /// Inspect the repository cache
    Cache {
        #[command(subcommand)]
        command: CacheCommands,
    },
}

#[derive(Args)]
struct SubmitArgs {
    /// Repository to open the PR against
    #[arg(long)]
    repo: String,

    /// Patch file in unified diff format, or - for stdin
    #[arg(long)]
    patch_file: PathBuf,

    /// Why the change is needed (commit message and PR body)
    #[arg(long)]
    reasoning: String,

    /// PR title (prefixed automatically)
    #[arg(long)]
    title: Option<String>,

    /// Branch to push (random if omitted)
    #[arg(long)]
    branch: Option<String>,

    /// What triggered this change, usually a PR URL
    #[arg(long)]
    triggered_by: Option<String>,

    /// Use an existing working tree instead of the cache
    #[arg(long)]
    repo_path: Option<PathBuf>,

    /// Preview and ask for confirmation before pushing
    #[arg(long)]
    confirm: bool,
}

#[derive(Subcommand)]
enum CacheCommands {
    /// Print the cache path for a repository URL
    Path {
        /// Repository URL
        repo_url: String,
    },
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "lapo=info",
        _ => "lapo=debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let global = GlobalOptions {
        config: cli.config,
        cache_dir: cli.cache_dir,
        mirror_root: cli.mirror_root,
    };

    let result = match cli.command {
        Commands::Diff { pr_url } => cli::diff::run_diff(&global, &pr_url, cli.quiet).await,
        Commands::Submit(args) => {
            let options = SubmitOptions {
                repo_url: args.repo,
                patch_file: args.patch_file,
                reasoning: args.reasoning,
                title: args.title,
                branch: args.branch,
                triggered_by: args.triggered_by,
                repo_path: args.repo_path,
                confirm: args.confirm,
                quiet: cli.quiet,
            };
            cli::submit::run_submit(&global, options).await
        }
        Commands::Cache {
            command: CacheCommands::Path { repo_url },
        } => cli::cache::run_cache_path(&global, &repo_url),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {e}", "error:".failure());
            ExitCode::FAILURE
        }
    }
}
