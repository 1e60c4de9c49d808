use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use stratflow::board::IssueType;
use stratflow::config::StratflowConfig;

mod cmd;

#[derive(Parser)]
#[command(name = "stratflow")]
#[command(version, about = "StratFlow board client with optimistic drag-and-drop moves")]
pub struct Cli {
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to stratflow.toml. Defaults to ./stratflow.toml, then the user config dir.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Board API base URL. Overrides stratflow.toml and STRATFLOW_API_URL.
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// Board to operate on. Overrides [board] default_board.
    #[arg(long, global = true)]
    pub board: Option<String>,

    /// Emit logs as JSON lines on stderr
    #[arg(long, global = true)]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show the board: columns, items and WIP usage
    Board,
    /// Move an item, as if it were dragged and dropped
    Move {
        /// Item to move
        item: String,
        /// Drop onto this item, taking its slot
        #[arg(long, conflicts_with = "column", required_unless_present = "column")]
        onto: Option<String>,
        /// Drop onto this column's drop zone, appending at the end
        #[arg(long)]
        column: Option<String>,
    },
    /// Create an issue at the end of a column
    Add {
        title: String,
        #[arg(long)]
        column: String,
        #[arg(long = "type", default_value = "task")]
        issue_type: IssueType,
    },
    /// View or validate configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
    /// Run a scripted session against an in-memory board
    Demo,
}

#[derive(Subcommand, Clone)]
pub enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Validate configuration and show any warnings
    Validate,
    /// Initialize a default stratflow.toml file
    Init,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // `config init` may point --config at a file that does not exist yet.
    let config = match (&cli.command, cli.config.as_deref()) {
        (Commands::Config { .. }, Some(path)) if !path.exists() => StratflowConfig::default(),
        (_, explicit) => StratflowConfig::discover(explicit)?,
    }
    .with_cli_args(cli.api_url.clone(), cli.board.clone(), cli.verbose, cli.json_logs);

    stratflow::logging::init(&config.log_level(), config.log_format())?;

    match &cli.command {
        Commands::Board => cmd::cmd_board(&config).await?,
        Commands::Move { item, onto, column } => {
            cmd::cmd_move(&config, item, onto.as_deref(), column.as_deref()).await?
        }
        Commands::Add {
            title,
            column,
            issue_type,
        } => cmd::cmd_add(&config, title, column, *issue_type).await?,
        Commands::Config { command } => {
            cmd::cmd_config(&config, cli.config.as_deref(), command.clone())?
        }
        Commands::Demo => cmd::cmd_demo().await?,
    }

    Ok(())
}
