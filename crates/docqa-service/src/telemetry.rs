use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use docqa_core::config::LoggingSettings;

/// Install the global subscriber. `RUST_LOG` wins over `logging.level`.
pub fn init_tracing(settings: &LoggingSettings) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&settings.level));
    let registry = tracing_subscriber::registry().with(filter);
    let result = if settings.json {
        registry.with(fmt::layer().json().with_writer(std::io::stderr)).try_init()
    } else {
        registry.with(fmt::layer().with_writer(std::io::stderr).with_ansi(false)).try_init()
    };
    if let Err(e) = result {
        eprintln!("tracing already initialized: {e}");
    }
}
