use anyhow::Result;
use clap::{ArgAction, Args as ClapArgs, Parser, Subcommand};
use reswirl::cache::CacheStorage;
use reswirl::config::{DEFAULT_GITHUB_API_URL, DEFAULT_PYPI_URL};
use reswirl::docs::{self, DocsSource, compare_inventories};
use reswirl::github::{self, GitHubSource};
use reswirl::output::{OutputFormat, render};
use reswirl::tree::{TreeWalker, WalkOptions};
use reswirl::{Config, Record, RetrieveOptions, Snapshot, Table};
use std::path::PathBuf;
use std::process;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Fetch documentation inventories and repository listings as tables
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Custom cache directory path (defaults to the platform cache directory)
    #[arg(long, env = "RESWIRL_CACHE_DIR", global = true)]
    cache_dir: Option<PathBuf>,

    /// Timeout for each remote request, in seconds
    #[arg(long, default_value_t = 10, global = true)]
    timeout: u64,

    /// More logging on stderr (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List the symbols in a package's objects.inv
    Docs {
        /// Package name on PyPI
        package: String,
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
        /// Documentation root to read objects.inv from, skipping PyPI lookup
        #[arg(long)]
        docs_url: Option<String>,
        /// PyPI JSON API base URL
        #[arg(long, env = "RESWIRL_PYPI_URL", default_value = DEFAULT_PYPI_URL)]
        pypi_url: String,
    },
    /// List a user's GitHub repositories
    Repos {
        username: String,
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
        #[command(flatten)]
        remote: RemoteArgs,
    },
    /// List files matching a glob across a user's repositories
    Files {
        username: String,
        /// Glob matched against paths inside each repository
        #[arg(short, long, default_value = "**")]
        pattern: String,
        /// Skip files larger than this many bytes
        #[arg(long)]
        max_size: Option<u64>,
        /// Only look at the top level of each repository
        #[arg(long)]
        top_level: bool,
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
        #[command(flatten)]
        remote: RemoteArgs,
    },
    /// Show symbols added or removed between two inventories
    Diff {
        /// Documentation root or objects.inv URL of the older version
        from_url: String,
        /// Documentation root or objects.inv URL of the newer version
        to_url: String,
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },
    /// Inspect or clear cached repository listings
    Cache {
        #[command(subcommand)]
        action: CacheCommand,
    },
}

#[derive(Subcommand, Debug)]
enum CacheCommand {
    /// List cached users
    List {
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },
    /// Remove the cached listing for a user
    Clear { username: String },
    /// Print the cache directory
    Path,
}

#[derive(ClapArgs, Debug)]
struct RemoteArgs {
    /// Neither read nor write the cache
    #[arg(long)]
    no_cache: bool,
    /// Fetch fresh data even when a cached listing exists
    #[arg(long)]
    refresh: bool,
    /// GitHub token for authenticated requests
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    token: Option<String>,
    /// GitHub REST API base URL
    #[arg(long, env = "RESWIRL_GITHUB_API_URL", default_value = DEFAULT_GITHUB_API_URL)]
    github_api_url: String,
}

impl RemoteArgs {
    fn configure(&self, config: Config) -> Config {
        config
            .with_github_token(self.token.clone())
            .with_github_api_url(&self.github_api_url)
    }

    fn options(&self) -> RetrieveOptions {
        RetrieveOptions {
            use_cache: !self.no_cache,
            force_refresh: self.refresh,
        }
    }
}

fn main() {
    let args = Args::parse();

    // RUST_LOG applies unless -v asks for more
    let filter = EnvFilter::builder()
        .with_default_directive(tracing::Level::WARN.into())
        .from_env_lossy();
    let filter = match args.verbose {
        0 => filter,
        1 => filter.add_directive(tracing::Level::INFO.into()),
        _ => filter.add_directive(tracing::Level::DEBUG.into()),
    };

    // Logs go to stderr so stdout stays clean for table/CSV/JSON output
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    if let Err(e) = run(args) {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

fn run(args: Args) -> Result<()> {
    let config = Config::new(args.cache_dir).with_timeout(Duration::from_secs(args.timeout));
    tracing::debug!(cache_dir = %config.cache_dir.display(), "configured");

    match args.command {
        Commands::Docs {
            package,
            format,
            docs_url,
            pypi_url,
        } => {
            let config = config.with_pypi_url(pypi_url);
            let inventory = DocsSource::inventory(&config, docs_url)?;
            let snapshot = inventory.retrieve(&package, RetrieveOptions::default())?;
            print_table(&snapshot.table, format)
        }
        Commands::Repos {
            username,
            format,
            remote,
        } => {
            let config = remote.configure(config);
            let inventory = GitHubSource::inventory(&config)?;
            let snapshot = inventory.retrieve(&username, remote.options())?;
            warn_if_stale(&snapshot, &username);
            print_table(&snapshot.table, format)
        }
        Commands::Files {
            username,
            pattern,
            max_size,
            top_level,
            format,
            remote,
        } => {
            let config = remote.configure(config);
            let inventory = GitHubSource::inventory(&config)?;
            let snapshot = inventory.retrieve(&username, remote.options())?;
            warn_if_stale(&snapshot, &username);

            let options = WalkOptions {
                pattern,
                max_size,
                recursive: !top_level,
            };
            let walker = TreeWalker::new(inventory.source(), username.as_str(), options)?;
            let files = walker
                .walk(snapshot.table.rows())
                .collect::<reswirl::Result<Table<_>>>()?;
            print_table(&files, format)
        }
        Commands::Diff {
            from_url,
            to_url,
            format,
        } => {
            let source = DocsSource::new(&config)?;
            let from = source.fetch_url(&docs::discovery::inventory_url_for(&from_url))?;
            let to = source.fetch_url(&docs::discovery::inventory_url_for(&to_url))?;
            print_table(&compare_inventories(&from, &to), format)
        }
        Commands::Cache { action } => {
            let storage = CacheStorage::new(&config.cache_dir);
            match action {
                CacheCommand::List { format } => {
                    let cached = storage.list(github::NAMESPACE)?;
                    print_table(&Table::new(cached), format)
                }
                CacheCommand::Clear { username } => {
                    if storage.remove(github::NAMESPACE, &username)? {
                        println!("Removed cached listing for {username}");
                    } else {
                        println!("No cached listing for {username}");
                    }
                    Ok(())
                }
                CacheCommand::Path => {
                    println!("{}", storage.cache_dir().display());
                    Ok(())
                }
            }
        }
    }
}

fn print_table<R: Record>(table: &Table<R>, format: OutputFormat) -> Result<()> {
    let text = render(table, format)?;
    println!("{}", text.trim_end());
    Ok(())
}

fn warn_if_stale<R>(snapshot: &Snapshot<R>, subject: &str) {
    if snapshot.is_stale() {
        eprintln!(
            "Warning: remote fetch failed; showing cached data for {subject}, which may be stale"
        );
    }
}
