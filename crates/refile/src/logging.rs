use crate::cli::LogFormat;
use anyhow::anyhow;
use simple_logger::SimpleLogger;
use tracing_subscriber::EnvFilter;

/// Install the process-wide logger.
///
/// Human output goes through `simple_logger` on stderr. JSON output uses a
/// `tracing-subscriber` formatter; `log` records from the libraries are bridged
/// into it, and `RUST_LOG` takes precedence over `-v` when set.
pub fn init(format: LogFormat, level: log::LevelFilter) -> anyhow::Result<()> {
    match format {
        LogFormat::Human => SimpleLogger::new()
            .with_level(level)
            .with_utc_timestamps()
            .init()
            .map_err(|e| anyhow!("Failed to initialize logger: {}", e)),
        LogFormat::Json => {
            let filter = EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(level.as_str().to_lowercase()));
            tracing_subscriber::fmt()
                .json()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .with_current_span(true)
                .try_init()
                .map_err(|e| anyhow!("Failed to initialize logger: {}", e))
        }
    }
}
