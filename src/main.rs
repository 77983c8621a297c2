mod cli;

use clap::Parser;
use cli::{Cli, Commands};
use m3u8proxy::config::Config;
use m3u8proxy::{api, observability};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let log_handle = observability::init_tracing(observability::DEFAULT_LOG_FILTER);
    let cli = Cli::parse();

    match cli.command {
        Commands::Server(args) => {
            let mut config = Config::load_with(args.config)?;
            if let Some(address) = args.address {
                config.server.bind_addr = address;
            }

            log_handle.apply_filter(&config.telemetry.log_filter);
            api::run(config).await?
        }
    }

    Ok(())
}
