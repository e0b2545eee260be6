use metrics::counter;
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Default filter used when `RUST_LOG` is not set
const DEFAULT_FILTER: &str = "itemcatalog=info,tower_http=warn";

/// Output format for log lines
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable lines for a local server
    Text,
    /// One JSON object per line, for the serverless log collector
    Json,
}

/// Initialize structured logging and metrics collection
pub fn init_logging_and_metrics(format: LogFormat) {
    // Set up environment filter for log levels
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    match format {
        LogFormat::Text => {
            // Initialize tracing subscriber with stdout output
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_target(true)
                        .with_writer(std::io::stdout),
                )
                .init();
        }
        LogFormat::Json => {
            // The log collector neither renders colours nor needs timestamps
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_current_span(true)
                        .with_target(true)
                        .with_ansi(false)
                        .without_time()
                        .with_writer(std::io::stdout),
                )
                .init();
        }
    }
    // Output debugging information
    info!(?format, "Logging and tracing initialized");
    // Initialize metrics with default values
    counter!("itemcatalog.items_created").absolute(0);
    counter!("itemcatalog.item_lookups").absolute(0);
    counter!("itemcatalog.item_not_found").absolute(0);
    counter!("itemcatalog.validation_errors").absolute(0);
    counter!("itemcatalog.rate_limit_errors").absolute(0);
    // Output debugging information
    info!("Metrics collection initialized");
}
