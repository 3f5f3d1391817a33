use chrono::Utc;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing::{debug, warn};

use live_standings::board::{BoardContext, NO_CONTEST};
use live_standings::config::{BoardConfig, Config};
use live_standings::error::StoreError;
use live_standings::store::{cache, RealtimeDb, SnapshotCache};

const EXIT_SUCCESS: i32 = 0;
const EXIT_NETWORK: i32 = 2;
const EXIT_CONFIG: i32 = 4;

#[derive(Subcommand, Debug)]
enum Commands {
    /// Full-screen live leaderboard (default if no subcommand)
    Watch,
    /// Print the current leaderboard once
    Show {
        #[arg(short, long, value_enum, default_value_t = Format::Table)]
        format: Format,
    },
    /// List known contests with their last update time
    Contests,
    /// Open the AtCoder profile of the team at a rank
    Open {
        /// Rank of the team (1-based, as shown by `show`)
        index: usize,
    },
    /// Interactive configuration wizard
    Init,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum Format {
    Table,
    Tsv,
    Json,
}

#[derive(Parser, Debug)]
#[command(name = "live-standings")]
#[command(about = "Live contest leaderboard in your terminal", long_about = None)]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to config file (defaults to ~/.config/live-standings/config.yaml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Do not read or write the snapshot cache
    #[arg(long, global = true)]
    no_cache: bool,

    /// Remove cached snapshots before starting
    #[arg(long, global = true)]
    clear_cache: bool,

    /// Board to show (defaults to the first configured board)
    #[arg(short, long, global = true)]
    board: Option<String>,

    /// Contest to show (defaults to the configured or most recent contest)
    #[arg(long, global = true)]
    contest: Option<String>,

    /// Realtime database URL
    #[arg(long, global = true, env = "LIVE_STANDINGS_DB_URL")]
    database_url: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Exit code for a failed command: store errors are network errors
fn exit_code(error: &anyhow::Error) -> i32 {
    if error.chain().any(|e| e.downcast_ref::<StoreError>().is_some()) {
        EXIT_NETWORK
    } else {
        EXIT_CONFIG
    }
}

fn config_error(message: impl std::fmt::Display) -> ! {
    eprintln!("Config error: {}", message);
    std::process::exit(EXIT_CONFIG);
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    live_standings::logging::init(cli.verbose);

    // Install rustls crypto provider (required for rustls 0.23+)
    if rustls::crypto::ring::default_provider()
        .install_default()
        .is_err()
    {
        debug!("rustls crypto provider already installed");
    }

    let command = cli.command.unwrap_or(Commands::Watch);

    if let Commands::Init = command {
        if let Err(e) = live_standings::config::init::run_init_wizard(cli.config) {
            config_error(format!("{:#}", e));
        }
        std::process::exit(EXIT_SUCCESS);
    }

    if cli.clear_cache {
        match cache::clear_cache() {
            Ok(()) => debug!("Snapshot cache cleared"),
            Err(e) => warn!(error = %e, "Failed to clear snapshot cache"),
        }
    }

    // Load config
    let mut config = match live_standings::config::load_config(cli.config) {
        Ok(c) => c,
        Err(e) => config_error(format!("{:#}", e)),
    };
    if let Some(url) = cli.database_url {
        config.database_url = url;
    }
    if let Err(errors) = live_standings::config::validate_config(&config) {
        eprintln!("Config errors:");
        for error in errors {
            eprintln!("  - {}", error);
        }
        std::process::exit(EXIT_CONFIG);
    }

    let board_index = match cli.board.as_deref() {
        Some(name) => match config.board_index(name) {
            Some(i) => i,
            None => {
                let known: Vec<&str> = config.boards.iter().map(|b| b.name.as_str()).collect();
                config_error(format!(
                    "Unknown board '{}'. Configured boards: {}",
                    name,
                    known.join(", ")
                ));
            }
        },
        None => 0,
    };
    let board = config.boards[board_index].clone();
    debug!(board = %board.name, root = %board.root, "Using board");

    let auth = std::env::var("LIVE_STANDINGS_DB_AUTH").ok();
    let source = match RealtimeDb::new(&config.database_url, auth) {
        Ok(db) => db,
        Err(e) => config_error(e),
    };

    let snapshot_cache = if cli.no_cache {
        SnapshotCache::disabled()
    } else {
        SnapshotCache::new(cache::get_cache_path(), &config.database_url)
    };

    let result = match command {
        Commands::Watch => {
            run_watch(
                config,
                board_index,
                cli.contest.as_deref(),
                source,
                snapshot_cache,
            )
            .await
        }
        Commands::Show { format } => {
            run_show(&config, &board, cli.contest.as_deref(), &source, format).await
        }
        Commands::Contests => {
            run_contests(&config, &board, cli.contest.as_deref(), &source).await
        }
        Commands::Open { index } => {
            run_open(&config, &board, cli.contest.as_deref(), &source, index).await
        }
        Commands::Init => Ok(()),
    };

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        std::process::exit(exit_code(&e));
    }

    std::process::exit(EXIT_SUCCESS);
}

async fn run_watch(
    config: Config,
    board_index: usize,
    contest: Option<&str>,
    source: RealtimeDb,
    snapshot_cache: SnapshotCache,
) -> anyhow::Result<()> {
    // Resolve the theme before the terminal enters raw mode
    let theme = live_standings::tui::resolve_theme(config.theme);

    // Without an explicit contest the TUI starts on the placeholder and
    // switches to the latest contest once the index arrives
    let pinned = contest.or(config.contest.as_deref());
    let app = live_standings::tui::App::new(
        config.clone(),
        board_index,
        pinned.unwrap_or(NO_CONTEST),
        pinned.is_some(),
        theme,
    );
    live_standings::tui::run_tui(app, source, snapshot_cache).await
}

async fn load_state(
    config: &Config,
    board: &BoardConfig,
    contest: Option<&str>,
    source: &RealtimeDb,
) -> anyhow::Result<live_standings::board::BoardState> {
    let contest = live_standings::fetch::resolve_contest(
        source,
        board,
        contest,
        config.contest.as_deref(),
    )
    .await?;
    debug!(contest = %contest, "Loading board");
    live_standings::fetch::load_board(source, BoardContext::new(board.clone(), &contest)).await
}

async fn run_show(
    config: &Config,
    board: &BoardConfig,
    contest: Option<&str>,
    source: &RealtimeDb,
    format: Format,
) -> anyhow::Result<()> {
    let state = load_state(config, board, contest, source).await?;
    let use_colors = live_standings::output::should_use_colors();

    match format {
        Format::Table => {
            println!(
                "{}",
                live_standings::output::format_header(&state, Utc::now(), use_colors)
            );
            println!("{}", live_standings::output::format_table(&state, use_colors));
        }
        Format::Tsv => print!("{}", live_standings::output::format_tsv(&state)),
        Format::Json => println!("{}", live_standings::output::format_json(&state)?),
    }
    Ok(())
}

async fn run_contests(
    config: &Config,
    board: &BoardConfig,
    contest: Option<&str>,
    source: &RealtimeDb,
) -> anyhow::Result<()> {
    let contests = live_standings::fetch::load_contests(source, board).await?;
    let current = live_standings::board::default_contest(
        contest,
        config.contest.as_deref(),
        &contests,
    );
    let use_colors = live_standings::output::should_use_colors();
    println!(
        "{}",
        live_standings::output::format_contests(&contests, Some(&current), Utc::now(), use_colors)
    );
    Ok(())
}

async fn run_open(
    config: &Config,
    board: &BoardConfig,
    contest: Option<&str>,
    source: &RealtimeDb,
    index: usize,
) -> anyhow::Result<()> {
    let state = load_state(config, board, contest, source).await?;

    // Validate index bounds (1-based)
    if index < 1 || index > state.standings.len() {
        anyhow::bail!(
            "Invalid rank {}. Must be between 1 and {}.",
            index,
            state.standings.len()
        );
    }

    let standing = &state.standings[index - 1];
    if standing.atcoder.is_empty() {
        anyhow::bail!("{} has no AtCoder handle", standing.name);
    }
    let url = standing.profile_url();
    live_standings::browser::open_url(&url)?;
    println!("Opening profile of {} in browser: {}", standing.name, url);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_errors_map_to_network_exit() {
        let err = anyhow::Error::new(StoreError::PermissionDenied("a/b".to_string()))
            .context("Failed to read standings");
        assert_eq!(exit_code(&err), EXIT_NETWORK);

        let err = anyhow::anyhow!("Invalid rank 9");
        assert_eq!(exit_code(&err), EXIT_CONFIG);
    }

    #[test]
    fn test_cli_defaults_to_watch() {
        let cli = Cli::parse_from(["live-standings"]);
        assert!(cli.command.is_none());
        assert!(!cli.no_cache);
    }

    #[test]
    fn test_cli_show_format() {
        let cli = Cli::parse_from(["live-standings", "--board", "all", "show", "--format", "tsv"]);
        assert_eq!(cli.board.as_deref(), Some("all"));
        match cli.command {
            Some(Commands::Show { format }) => assert_eq!(format, Format::Tsv),
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_cli_open_index_after_global_flags() {
        let cli = Cli::parse_from(["live-standings", "open", "3", "--contest", "abc300"]);
        assert_eq!(cli.contest.as_deref(), Some("abc300"));
        assert!(matches!(cli.command, Some(Commands::Open { index: 3 })));
    }
}
