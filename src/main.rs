use flowscout::cli::commands::{CliArgs, Commands};
use flowscout::cli::handlers::{handle_query, handle_repository};
use flowscout::util::logging::{init_logging, parse_level, LoggingConfig};
use flowscout::VERSION;

use clap::Parser;
use tracing::{debug, Level};

#[tokio::main]
async fn main() {
    let args = CliArgs::parse();
    init_logging_from_args(&args);

    debug!("flowscout v{} starting", VERSION);
    debug!("Arguments: {:?}", args);

    let exit_code = match &args.command {
        Commands::Repository(repository_args) => handle_repository(repository_args).await,
        Commands::Query(query_args) => handle_query(query_args).await,
    };

    std::process::exit(exit_code);
}

fn init_logging_from_args(args: &CliArgs) {
    let config = LoggingConfig::from_env();

    let config = if let Some(level_str) = &args.log_level {
        config.level(parse_level(level_str))
    } else if args.verbose {
        config.level(Level::DEBUG)
    } else if args.quiet {
        config.level(Level::ERROR)
    } else {
        config
    };

    init_logging(config);
}
