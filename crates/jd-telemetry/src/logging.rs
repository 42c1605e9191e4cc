use std::io;

use tracing_subscriber::{fmt, EnvFilter};

/// Level used when neither `RUST_LOG` nor the configured level is usable.
pub const FALLBACK_LEVEL: &str = "info";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Human,
    Json,
}

/// Filter from `RUST_LOG`, else `default_level`, else [`FALLBACK_LEVEL`].
///
/// `default_level` accepts full directives such as `"jd_client=debug,warn"`.
pub fn env_filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| EnvFilter::new(FALLBACK_LEVEL))
}

/// Install the global subscriber in the requested format.
///
/// Safe to call multiple times (e.g. in tests) -- subsequent calls are no-ops.
pub fn init(format: LogFormat, service_name: &str, default_level: &str) {
    let filter = env_filter(default_level);
    let builder = fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(true)
        .with_level(true);

    match format {
        LogFormat::Human => builder.compact().try_init().ok(),
        LogFormat::Json => builder
            .json()
            .with_file(true)
            .with_line_number(true)
            .try_init()
            .ok(),
    };

    tracing::debug!(service = service_name, ?format, "logging initialised");
}

/// Initialize logging with human-readable output on stderr.
pub fn init_logging(service_name: &str, default_level: &str) {
    init(LogFormat::Human, service_name, default_level);
}

/// Initialize logging with one JSON object per line on stderr.
pub fn init_logging_json(service_name: &str, default_level: &str) {
    init(LogFormat::Json, service_name, default_level);
}
