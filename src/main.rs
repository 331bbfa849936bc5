//! Teamspace CLI entry point.

use clap::Parser;

use teamspace::cli::{commands, handle_error, Cli, Commands};
use teamspace::infrastructure::config::ConfigLoader;
use teamspace::infrastructure::logging::{LogConfig, LoggerImpl};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // A broken config file is reported by the command itself
    let log_config = ConfigLoader::load()
        .map(|config| LogConfig::from(&config.logging))
        .unwrap_or_default();
    let _logger = match LoggerImpl::init(&log_config) {
        Ok(logger) => Some(logger),
        Err(e) => {
            eprintln!("warning: logging disabled: {e:#}");
            None
        }
    };

    let result = match cli.command {
        Commands::Init(args) => commands::init::execute(args, cli.json).await,
        Commands::Config(args) => commands::config::execute(args, cli.json).await,
        Commands::Problem(args) => commands::problem::execute(args, cli.json).await,
        Commands::Profile(args) => commands::profile::execute(args, cli.json).await,
        Commands::Vote(args) => commands::vote::execute(args, cli.json).await,
        Commands::Team(args) => commands::team::execute(args, cli.json).await,
        Commands::Ws(args) => commands::workspace::execute(args, cli.json).await,
        Commands::Tree(args) => commands::tree::execute(args, cli.json).await,
        Commands::Similarity(args) => commands::similarity::execute(args, cli.json).await,
    };

    if let Err(err) = result {
        handle_error(err, cli.json);
    }
}
