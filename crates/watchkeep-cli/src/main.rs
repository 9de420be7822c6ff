use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;
use watch_state_config::PathManager;
use watch_state_models::{ContentType, WatchedStatus};

mod app;
mod commands;
mod logging;
mod output;

#[derive(Parser)]
#[command(name = "watchkeep")]
#[command(about = "Watchkeep - track what you watch and import lists from anywhere")]
#[command(version)]
struct Cli {
    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Output format
    #[arg(long, global = true, default_value = "human", value_enum)]
    output: output::OutputFormat,

    /// User whose records are read and written
    #[arg(long, global = true, default_value_t = 1)]
    user: u64,

    /// Write logs to the rotating log file instead of stderr
    #[arg(long, global = true, action = ArgAction::SetTrue)]
    log_to_file: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start tracking a movie or show by catalog id
    Add {
        /// Catalog (TMDB) id
        catalog_id: u64,

        /// Content type: movie or tv
        #[arg(long = "type", default_value = "movie")]
        content_type: ContentType,

        /// Initial status
        #[arg(long, default_value = "planned")]
        status: WatchedStatus,

        /// Rating from 0 to 10
        #[arg(long)]
        rating: Option<u8>,
    },
    /// Change status, rating or thoughts of a record
    Update {
        record_id: u64,

        #[arg(long)]
        status: Option<WatchedStatus>,

        #[arg(long)]
        rating: Option<u8>,

        #[arg(long, conflicts_with = "remove_thoughts")]
        thoughts: Option<String>,

        #[arg(long, action = ArgAction::SetTrue)]
        remove_thoughts: bool,
    },
    /// Set or remove the status of one season of a show
    Season {
        record_id: u64,

        season_number: u32,

        #[arg(long, required_unless_present = "remove")]
        status: Option<WatchedStatus>,

        #[arg(long)]
        rating: Option<u8>,

        /// Remove the season instead
        #[arg(long, action = ArgAction::SetTrue, conflicts_with_all = ["status", "rating"])]
        remove: bool,
    },
    /// Stop tracking a record (its history is kept)
    Delete { record_id: u64 },
    /// List tracked records, most recently updated first
    List {
        /// Only show one status
        #[arg(long)]
        status: Option<WatchedStatus>,
    },
    /// Show one record with its seasons and history
    Show { record_id: u64 },
    /// Show or add to the activity history of a record
    Activity {
        record_id: u64,

        /// Include history of a deleted record
        #[arg(long, action = ArgAction::SetTrue)]
        include_deleted: bool,

        /// Append a note instead of listing
        #[arg(long)]
        note: Option<String>,

        /// Date to display for the note (YYYY-MM-DD or RFC 3339)
        #[arg(long, requires = "note")]
        date: Option<String>,
    },
    /// Watched counts for the user
    Profile,
    /// Import a watch list from a JSON or CSV file
    #[command(long_about = "Reconcile a JSON array of entries or a CSV file (name,year,type,state,rating,rating_date,tmdb_id) against the catalog. Every entry gets one outcome: SUCCESS, ALREADY_EXISTS, MULTI_CANDIDATE, NOT_FOUND or FAILED.")]
    Import {
        file: PathBuf,

        /// Entries reconciled at once (defaults to import.concurrency)
        #[arg(long)]
        concurrency: Option<usize>,

        /// Pick a candidate for every ambiguous entry
        #[arg(long, action = ArgAction::SetTrue)]
        interactive: bool,
    },
    /// Manage configuration
    Config {
        #[command(subcommand)]
        cmd: ConfigCommands,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show the effective configuration (api key masked)
    Show,
    /// Write a default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long, action = ArgAction::SetTrue)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    let paths = PathManager::default();

    let log_file = cli.log_to_file.then(|| paths.log_file());
    logging::init_logging(cli.verbose, cli.quiet, log_file)
        .map_err(|e| color_eyre::eyre::eyre!("{}", e))?;

    let output = output::Output::new(cli.output, cli.quiet);
    let user = cli.user;

    if let Commands::Config { cmd } = cli.command {
        return commands::config::run_config(cmd, &paths, &output);
    }

    let app = app::App::load(&paths)?;
    match cli.command {
        Commands::Add { catalog_id, content_type, status, rating } => {
            commands::records::add(&app, user, catalog_id, content_type, status, rating, &output).await
        }
        Commands::Update { record_id, status, rating, thoughts, remove_thoughts } => {
            commands::records::update(&app, record_id, status, rating, thoughts, remove_thoughts, &output).await
        }
        Commands::Season { record_id, season_number, status, rating, remove } => {
            commands::records::season(&app, record_id, season_number, status, rating, remove, &output).await
        }
        Commands::Delete { record_id } => commands::records::delete(&app, record_id, &output).await,
        Commands::List { status } => commands::records::list(&app, user, status, &output).await,
        Commands::Show { record_id } => commands::records::show(&app, record_id, &output).await,
        Commands::Activity { record_id, include_deleted, note, date } => {
            commands::records::activity(&app, record_id, include_deleted, note, date, &output).await
        }
        Commands::Profile => commands::records::profile(&app, user, &output).await,
        Commands::Import { file, concurrency, interactive } => {
            commands::import::run_import(&app, user, &file, concurrency, interactive, &output).await
        }
        Commands::Config { .. } => Ok(()),
    }
}
