use clap::{ArgAction, Parser, Subcommand};
use commands::{cleanup, config, episodes, migrate, refresh, AppContext};
use std::path::PathBuf;
use watch_core::EpisodeAction;

mod commands;
mod logging;
mod output;

#[derive(Parser)]
#[command(name = "seasonkeeper")]
#[command(about = "SeasonKeeper - Track where you are in every series")]
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

    /// Library file to use instead of the configured one
    #[arg(long, global = true, value_name = "PATH")]
    store: Option<PathBuf>,

    /// Write logs to the daily-rotated file in the logs directory instead of stderr
    #[arg(long, global = true)]
    log_to_file: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Backfill season counts and reconcile watched seasons for a user
    #[command(long_about = "Look up the season count of every series that lacks one and rewrite the watched-seasons list of fully watched series. Items are processed one at a time with a pause after every catalog call.")]
    Migrate {
        /// Owner of the series to migrate
        #[arg(long)]
        user: String,

        /// Skip the confirmation prompt
        #[arg(long, short = 'y', action = ArgAction::SetTrue)]
        yes: bool,
    },
    /// Fetch the season count of one series from the catalog
    Refresh {
        /// Item id
        item: String,

        /// Title to look up (defaults to the stored title)
        #[arg(long)]
        title: Option<String>,
    },
    /// Show episode progress for a series
    Progress {
        item: String,
    },
    /// Show the next unwatched episode
    Next {
        item: String,
    },
    /// Mark an episode watched, or unwatched if it already is
    Toggle {
        item: String,
        season: u32,
        episode: u32,
    },
    /// Mark every episode of a season watched
    MarkSeason {
        item: String,
        season: u32,

        /// Episode count (defaults to the stored count for the season)
        #[arg(long)]
        episodes: Option<u32>,
    },
    /// Forget every watched episode of a season
    ClearSeason {
        item: String,
        season: u32,
    },
    /// List the episodes of a season, fetching its episode count if unknown
    Episodes {
        item: String,
        season: u32,
    },
    /// Repair malformed watch data for a user's series
    Cleanup {
        #[arg(long)]
        user: String,
    },
    /// Manage configuration
    Config {
        #[command(subcommand)]
        cmd: ConfigCommands,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show current configuration (masks the API key)
    Show {
        /// Show the API key unmasked
        #[arg(long, action = ArgAction::SetTrue)]
        full: bool,
    },
    /// Write a default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long, action = ArgAction::SetTrue)]
        force: bool,
    },
    /// Store the catalog API key
    SetKey {
        /// API key (if not provided, will prompt)
        #[arg(long)]
        key: Option<String>,
    },
}

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    let ctx = AppContext::load(cli.store.clone())?;

    let log_file = logging::resolve_log_file(&ctx.config.logging, &ctx.paths, cli.log_to_file);
    logging::init_logging_with_file(cli.verbose, cli.quiet, &ctx.config.logging, log_file)
        .map_err(|e| color_eyre::eyre::eyre!("{}", e))?;

    let output = output::Output::new(cli.output, cli.quiet);

    match cli.command {
        Commands::Migrate { user, yes } => migrate::run_migrate(&ctx, &user, yes, &output).await,
        Commands::Refresh { item, title } => refresh::run_refresh(&ctx, &item, title, &output).await,
        Commands::Progress { item } => episodes::run_progress(&ctx, &item, &output).await,
        Commands::Next { item } => episodes::run_next(&ctx, &item, &output).await,
        Commands::Toggle { item, season, episode } => {
            episodes::run_action(&ctx, &item, EpisodeAction::Toggle { season, episode }, &output).await
        }
        Commands::MarkSeason { item, season, episodes: count } => {
            episodes::run_action(&ctx, &item, EpisodeAction::MarkSeason { season, episodes: count }, &output).await
        }
        Commands::ClearSeason { item, season } => {
            episodes::run_action(&ctx, &item, EpisodeAction::ClearSeason { season }, &output).await
        }
        Commands::Episodes { item, season } => episodes::run_list(&ctx, &item, season, &output).await,
        Commands::Cleanup { user } => cleanup::run_cleanup(&ctx, &user, &output).await,
        Commands::Config { cmd } => config::run_config(&ctx, cmd, &output),
    }
}
