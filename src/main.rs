use anyhow::Result;
use clap::Parser;

use itemcatalog::cli::{Cli, Commands};
use itemcatalog::gateway::{self, GatewayConfig};
use itemcatalog::server::{self, ServerConfig};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let cli = Cli::parse();
    // Run the specified command
    match cli.into_command() {
        Commands::Start {
            bind_address,
            rate_limit_rps,
            rate_limit_burst,
        } => {
            // Create the server config
            let config = ServerConfig {
                bind_address,
                rate_limit_rps,
                rate_limit_burst,
            };
            server::start_server(config).await
        }
        Commands::Lambda { base_path } => gateway::start_lambda(GatewayConfig { base_path }).await,
    }
}
