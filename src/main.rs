//! repo-insight CLI - GitHub repository analytics
//!
//! Resolves a repository URL and prints a report of its details, activity and
//! contributors.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use repo_insight::{
    aggregator::ReportAggregator,
    github::{ClientConfig, GitHubClient, DEFAULT_API_BASE},
    identifier::{self, DEFAULT_HOST},
    provider::ResourceProvider,
    proxy::ProxyClient,
    render::{self, Format, RenderConfig},
};

/// repo-insight: GitHub repository analytics reports
#[derive(Parser, Debug)]
#[command(name = "repo-insight")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Fetch every section and print the report
    Analyze(AnalyzeArgs),

    /// Print the canonical owner/name of a repository URL
    Resolve(ResolveArgs),
}

#[derive(Parser, Debug)]
struct AnalyzeArgs {
    /// Repository URL, e.g. https://github.com/octocat/Hello-World
    url: String,

    /// Output format (text, json, html)
    #[arg(short, long, default_value = "text")]
    format: Format,

    /// Write the report to a file instead of stdout
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// GitHub token for API operations
    #[arg(long, env = "GITHUB_TOKEN")]
    github_token: Option<String>,

    /// GitHub REST API root
    #[arg(long, env = "GITHUB_API_URL", default_value = DEFAULT_API_BASE)]
    api_base: String,

    /// Web host accepted in repository URLs
    #[arg(long, default_value = DEFAULT_HOST)]
    host: String,

    /// Fetch through a backend proxy at this base URL instead of GitHub
    #[arg(long, value_name = "URL")]
    proxy: Option<String>,

    /// Delay before retrying statistics that are still being computed (0 disables)
    #[arg(long, default_value = "2000")]
    pending_retry_ms: u64,

    /// Title of the HTML report
    #[arg(long)]
    title: Option<String>,
}

#[derive(Parser, Debug)]
struct ResolveArgs {
    /// Repository URL
    url: String,

    /// Web host accepted in repository URLs
    #[arg(long, default_value = DEFAULT_HOST)]
    host: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Analyze(args) => analyze_command(args).await,
        Commands::Resolve(args) => resolve_command(args),
    }
}

fn build_provider(args: &AnalyzeArgs) -> Result<Arc<dyn ResourceProvider>> {
    if let Some(base) = &args.proxy {
        let proxy = ProxyClient::new(base)
            .context("Failed to configure proxy")?
            .with_host(&args.host);
        info!("Using backend proxy at {}", base);
        return Ok(Arc::new(proxy));
    }

    let pending_retry = (args.pending_retry_ms > 0).then(|| Duration::from_millis(args.pending_retry_ms));
    let config = ClientConfig {
        api_base: args.api_base.clone(),
        token: args.github_token.clone(),
        pending_retry,
        ..Default::default()
    };
    let client = GitHubClient::new(config).context("Failed to create GitHub client")?;

    if !client.is_authenticated() {
        warn!("No GitHub token provided, unauthenticated requests are heavily rate limited");
    }

    Ok(Arc::new(client))
}

async fn analyze_command(args: AnalyzeArgs) -> Result<()> {
    let id = identifier::resolve_with_host(&args.url, &args.host)
        .context("Failed to resolve repository URL")?;

    let aggregator = ReportAggregator::new(build_provider(&args)?);
    let report = aggregator
        .analyze(&id)
        .await
        .with_context(|| format!("Failed to analyze {}", id))?;

    let errors = report.error_count();
    if errors > 0 {
        warn!("{} section(s) could not be loaded", errors);
    }

    let mut config = RenderConfig {
        host: args.host.clone(),
        ..Default::default()
    };
    if let Some(title) = args.title {
        config.title = title;
    }

    match &args.output {
        Some(path) => {
            render::write_report(&report, args.format, &config, path)
                .with_context(|| format!("Failed to write report to {}", path.display()))?;
            info!("{} report written to {}", args.format, path.display());
        }
        None => {
            let output = render::render(&report, args.format, &config).context("Failed to render report")?;
            println!("{}", output);
        }
    }

    Ok(())
}

fn resolve_command(args: ResolveArgs) -> Result<()> {
    let id = identifier::resolve_with_host(&args.url, &args.host)
        .context("Failed to resolve repository URL")?;
    println!("{}", id);
    Ok(())
}
