use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crossdiff::{GitHubApiClient, LocalGit, OverlapAnalyzer, RemoteChanges, DEFAULT_API_ROOT};

#[derive(Parser)]
#[command(name = "crossdiff")]
#[command(about = "Find files changed both upstream and in a local branch")]
#[command(version)]
struct Cli {
    /// Repository owner on the hosting service
    #[arg(long)]
    owner: String,

    /// Repository name on the hosting service
    #[arg(long)]
    repo: String,

    /// API token (falls back to GITHUB_TOKEN)
    #[arg(long)]
    token: Option<String>,

    /// Path to the local repository clone
    #[arg(long, default_value = ".")]
    path: PathBuf,

    /// Compare API root, e.g. for GitHub Enterprise
    #[arg(long, default_value = DEFAULT_API_ROOT)]
    api_root: String,

    /// HTTP timeout in seconds (no timeout when omitted)
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Print the overlap as a JSON array
    #[arg(long)]
    json: bool,

    /// Print progress details
    #[arg(short, long)]
    verbose: bool,

    /// Branch compared through the hosting service
    branch_a: String,

    /// Branch compared through the local repository
    branch_b: String,
}

fn main() {
    if let Err(e) = run() {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    let token = cli
        .token
        .clone()
        .or_else(|| env::var("GITHUB_TOKEN").ok())
        .context("GitHub token not found: pass --token or set GITHUB_TOKEN")?;

    let mut client = GitHubApiClient::new(token)?.with_api_root(cli.api_root.clone());
    if let Some(secs) = cli.timeout_secs {
        client = client.with_timeout(Duration::from_secs(secs))?;
    }

    let remote = RemoteChanges::new(client, cli.owner.clone(), cli.repo.clone());
    let local = LocalGit::new(cli.path.clone());
    let analyzer =
        OverlapAnalyzer::from_parts(remote, local, cli.branch_a.clone(), cli.branch_b.clone());

    if cli.verbose {
        println!(
            "{} Comparing {} (remote {}/{}) against {} (local {})",
            "→".blue(),
            cli.branch_a.cyan(),
            cli.owner,
            cli.repo,
            cli.branch_b.cyan(),
            cli.path.display()
        );
    }

    let files = analyzer.find_overlapping_changed_files()?;

    if cli.verbose {
        println!("{} {} overlapping file(s)", "✓".green(), files.len());
    }

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&files)?);
    } else {
        for file in &files {
            println!("{}", file);
        }
    }

    Ok(())
}
