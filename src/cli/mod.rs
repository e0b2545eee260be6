use clap::{Parser, Subcommand};

/// Environment variable set by the AWS Lambda runtime
const LAMBDA_RUNTIME_ENV: &str = "AWS_LAMBDA_RUNTIME_API";

#[derive(Parser)]
#[command(name = "itemcatalog")]
#[command(about = "In-memory item catalog HTTP service")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Start the standalone HTTP server
    Start {
        /// The HTTP server bind address (host:port)
        #[arg(long, env = "ITEM_CATALOG_BIND_ADDRESS", default_value = "127.0.0.1:8000")]
        bind_address: String,
        /// Maximum requests per second per client (disabled when unset)
        #[arg(long, env = "ITEM_CATALOG_RATE_LIMIT_RPS")]
        rate_limit_rps: Option<u32>,
        /// Maximum burst size per client when rate limiting is enabled
        #[arg(long, env = "ITEM_CATALOG_RATE_LIMIT_BURST", default_value_t = 50)]
        rate_limit_burst: u32,
    },
    /// Serve requests delivered by the AWS Lambda runtime
    Lambda {
        /// Deployment stage prefix stripped from request paths
        #[arg(long, env = "ITEM_CATALOG_BASE_PATH", default_value = "/dev")]
        base_path: String,
    },
}

impl Cli {
    /// Resolve the command to run, picking one when none was given
    ///
    /// A Lambda bootstrap is executed without arguments, so the runtime's own
    /// environment decides between the adapter and the standalone server.
    pub fn into_command(self) -> Commands {
        match self.command {
            Some(command) => command,
            None => {
                let mode = match std::env::var_os(LAMBDA_RUNTIME_ENV) {
                    Some(_) => "lambda",
                    None => "start",
                };
                Self::parse_from(["itemcatalog", mode]).into_command()
            }
        }
    }
}
