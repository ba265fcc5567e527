use cinesync_config::{Config, PathManager};
use cinesync_models::{ListName, MediaKind};
use clap::{ArgAction, Parser, Subcommand};
use color_eyre::eyre::eyre;
use commands::{config, list, show, watch};
use std::path::PathBuf;

mod commands;
mod logging;
mod output;

#[derive(Parser)]
#[command(name = "cinesync")]
#[command(about = "CineSync - Your watchlist and favorites, in sync everywhere")]
#[command(version)]
struct Cli {
    /// Enable verbose output (use multiple times for more verbosity: -v, -vv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Output format
    #[arg(long, global = true, default_value = "human", value_enum)]
    output: output::OutputFormat,

    /// User id to act as (defaults to user.default_uid from the configuration)
    #[arg(long, global = true, value_name = "UID")]
    user: Option<String>,

    /// Configuration file to use instead of the default one
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage your watchlist
    Watchlist {
        #[command(subcommand)]
        cmd: ListCommands,
    },
    /// Manage your favorites
    Favorites {
        #[command(subcommand)]
        cmd: ListCommands,
    },
    /// Show your user document: list sizes and timestamps
    Show,
    /// Print every update of your user document until Ctrl-C
    #[command(long_about = "Follow your user document and print each snapshot as it arrives. Changes made by other cinesync processes sharing the same data file are picked up by polling the file.")]
    Watch {
        /// How often to check the data file for changes from other processes, in milliseconds
        #[arg(long, default_value_t = 1000, value_name = "MS")]
        poll_ms: u64,
    },
    /// View or create the configuration file
    Config {
        #[command(subcommand)]
        cmd: ConfigCommands,
    },
}

#[derive(Subcommand)]
pub enum ListCommands {
    /// Add a title to the list
    #[command(long_about = "Add a title to the list. Titles already on the list (same id) are skipped unless --allow-duplicate is given.")]
    Add {
        /// Catalog id of the title
        #[arg(long)]
        id: u64,

        #[arg(long)]
        title: String,

        /// movie or tv
        #[arg(long, default_value = "movie")]
        kind: MediaKind,

        /// Release year
        #[arg(long)]
        year: u32,

        #[arg(long, default_value_t = 0.0)]
        rating: f64,

        /// Poster URL or path
        #[arg(long, default_value = "")]
        poster: String,

        /// Add even if an entry with this id is already on the list
        #[arg(long, action = ArgAction::SetTrue)]
        allow_duplicate: bool,
    },
    /// Remove every entry with this id from the list
    Remove { id: u64 },
    /// List the entries, oldest first
    List,
    /// Check whether an id is on the list
    Contains { id: u64 },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show the effective configuration and where it lives
    Show,
    /// Write a configuration file with defaults
    Init {
        /// User to sign in as when --user is not given
        #[arg(long, value_name = "UID")]
        default_uid: Option<String>,

        /// Overwrite an existing configuration file
        #[arg(long, action = ArgAction::SetTrue)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();

    let paths = PathManager::default();
    let config_file = cli.config.clone().unwrap_or_else(|| paths.config_file());
    let config = Config::load_or_default(&config_file)
        .map_err(|e| eyre!("Failed to load config from {}: {}", config_file.display(), e))?;
    config
        .validate()
        .map_err(|e| eyre!("Invalid configuration in {}: {}", config_file.display(), e))?;

    logging::init_logging(cli.verbose, cli.quiet, &config.logging)
        .map_err(|e| eyre!("{}", e))?;

    let output = output::Output::new(cli.output, cli.quiet);

    match cli.command {
        Commands::Watchlist { cmd } => {
            let session = commands::open_session(config, &paths, cli.user).await?;
            list::run_list(ListName::Watchlist, cmd, session, &output).await
        }
        Commands::Favorites { cmd } => {
            let session = commands::open_session(config, &paths, cli.user).await?;
            list::run_list(ListName::Favorites, cmd, session, &output).await
        }
        Commands::Show => {
            let session = commands::open_session(config, &paths, cli.user).await?;
            show::run_show(session, &output).await
        }
        Commands::Watch { poll_ms } => {
            let session = commands::open_session(config, &paths, cli.user).await?;
            watch::run_watch(session, poll_ms, &output).await
        }
        Commands::Config { cmd } => config::run_config(cmd, config, &config_file, &paths, &output),
    }
}
