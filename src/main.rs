use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use profile_readme::config::Overrides;
use profile_readme::{Config, GitHubClient, ProfileUpdater};

#[derive(Parser)]
#[command(name = "profile-readme")]
#[command(about = "Keeps a GitHub profile README in sync with your newest repositories and commits")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path (defaults to XDG config location)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Render the profile README and push it to <owner>/<owner>
    Update(UpdateArgs),

    /// List active (non-fork, non-archived) repositories of the owner
    List {
        /// Organization name
        #[arg(short, long)]
        org: Option<String>,

        /// GitHub login (overrides --org)
        #[arg(short = 'g', long)]
        login: Option<String>,
    },

    /// Write a default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Print the version
    Version,
}

#[derive(Args)]
struct UpdateArgs {
    /// Organization name
    #[arg(short, long)]
    org: Option<String>,

    /// Repository name prefixes, comma separated ("*" for all)
    #[arg(short, long, value_delimiter = ',')]
    repos: Option<Vec<String>>,

    /// Branch the README is committed to [default: main]
    #[arg(short, long)]
    branch: Option<String>,

    /// Debug logging
    #[arg(short, long)]
    debug: bool,

    /// Maximum number of repositories listed [default: 25]
    #[arg(short, long)]
    limit: Option<usize>,

    /// Full name
    #[arg(short, long = "fullname")]
    fullname: Option<String>,

    /// Display name
    #[arg(short, long)]
    name: Option<String>,

    /// GitHub login (overrides --org)
    #[arg(short = 'g', long)]
    login: Option<String>,

    /// Profile URL
    #[arg(short, long)]
    url: Option<String>,

    /// Markdown template file
    #[arg(short, long)]
    template: Option<String>,

    /// Include forked repositories
    #[arg(long)]
    include_forks: bool,

    /// Render and print without pushing
    #[arg(long)]
    dry_run: bool,
}

impl From<&UpdateArgs> for Overrides {
    fn from(args: &UpdateArgs) -> Self {
        Overrides {
            org: args.org.clone(),
            login: args.login.clone(),
            repos: args.repos.clone(),
            branch: args.branch.clone(),
            limit: args.limit,
            full_name: args.fullname.clone(),
            name: args.name.clone(),
            url: args.url.clone(),
            template: args.template.clone(),
            include_forks: args.include_forks,
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(err) = run(cli).await {
        error!("{:#}", err);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    // `init` writes the file, so there is nothing to load yet
    let loaded = match &cli.command {
        Commands::Init { .. } => Ok(Config::default()),
        _ => Config::load_or_default(cli.config.as_deref()),
    };

    // Set up logging even when the file is broken so the error gets reported
    let fallback = Config::default();
    let verbose = cli.verbose || matches!(&cli.command, Commands::Update(args) if args.debug);
    init_logging(verbose, loaded.as_ref().unwrap_or(&fallback))?;
    debug!("Starting profile-readme v{}", env!("CARGO_PKG_VERSION"));

    let mut config = loaded?;

    match cli.command {
        Commands::Update(args) => cmd_update(args, &mut config).await,
        Commands::List { org, login } => cmd_list(org, login, &mut config).await,
        Commands::Init { force } => cmd_init(cli.config.as_deref(), force, &config),
        Commands::Version => {
            println!("version: {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

/// Initialize logging based on verbosity level. Logs go to stderr so stdout
/// carries only the rendered document.
fn init_logging(verbose: bool, config: &Config) -> Result<()> {
    let filter = if verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level))
    };

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(config.logging.color),
        )
        .with(filter)
        .try_init()
        .context("Failed to initialize logging")?;

    Ok(())
}

async fn connect(config: &Config) -> Result<GitHubClient> {
    let token = config.token.as_deref().unwrap_or("");
    let client = GitHubClient::authenticate(token, config.github.api_url.as_deref())
        .await
        .context("Failed to authenticate with GitHub")?;
    Ok(client)
}

/// Render the profile README and push it
async fn cmd_update(args: UpdateArgs, config: &mut Config) -> Result<()> {
    config.apply_overrides(Overrides::from(&args));
    config.resolve_token();
    config.validate()?;

    let config = &*config;
    debug!(
        org = ?config.github.org,
        login = ?config.github.login,
        repos = ?config.github.repos,
        branch = %config.github.branch,
        limit = config.github.limit,
        full_name = %config.profile.full_name,
        dry_run = args.dry_run,
        "update parameters"
    );

    let client = connect(config).await?;
    let summary = ProfileUpdater::new(&client, config)?
        .dry_run(args.dry_run)
        .run()
        .await?;

    println!("{}", summary.document);

    info!(
        "{} repositories, {} commits rendered for {}{}",
        summary.repositories,
        summary.commits,
        summary.owner,
        if summary.pushed { ", README pushed" } else { "" }
    );

    Ok(())
}

/// List active repositories of the owner
async fn cmd_list(org: Option<String>, login: Option<String>, config: &mut Config) -> Result<()> {
    config.apply_overrides(Overrides {
        org,
        login,
        ..Overrides::default()
    });
    config.resolve_token();

    let owner = config.owner()?.to_string();
    let client = connect(config).await?;

    let repositories = client
        .get_repository_non_forked_non_archived(&owner)
        .await
        .with_context(|| format!("Failed to list repositories for {}", owner))?;

    println!("Repositories ({}):", repositories.len());
    for repo in repositories {
        match &repo.description {
            Some(description) => println!("  {} - {}", repo.name, description),
            None => println!("  {}", repo.name),
        }
    }

    Ok(())
}

/// Write a default configuration file
fn cmd_init(path: Option<&Path>, force: bool, config: &Config) -> Result<()> {
    let path = match path {
        Some(path) => path.to_path_buf(),
        None => Config::default_config_path()?,
    };

    if path.exists() && !force {
        anyhow::bail!("Configuration already exists at {:?} (use --force to overwrite)", path);
    }

    config.save(&path)?;
    info!("Configuration saved to: {:?}", path);
    println!("Configuration written to {}", path.display());

    Ok(())
}
