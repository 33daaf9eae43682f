use crate::config::AppConfig;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Install the global subscriber: rolling file output plus (for text logs)
/// stdout. Keep the returned guard alive until exit or buffered lines are lost.
pub fn init_logging(config: &AppConfig) -> WorkerGuard {
    let log = &config.log;
    let file_appender = match log.rotation.as_str() {
        "hourly" => tracing_appender::rolling::hourly(&log.dir, &log.file),
        "daily" => tracing_appender::rolling::daily(&log.dir, &log.file),
        _ => tracing_appender::rolling::never(&log.dir, &log.file),
    };

    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(config.log_level()));

    let registry = tracing_subscriber::registry().with(filter);

    if log.json {
        let file_layer = fmt::layer()
            .json()
            .with_target(true)
            .with_writer(non_blocking)
            .with_ansi(false);
        registry.with(file_layer).init();
    } else {
        let file_layer = fmt::layer()
            .with_target(false)
            .with_writer(non_blocking)
            .with_ansi(false);
        let stdout_layer = fmt::layer().with_target(false).with_ansi(true);
        registry.with(file_layer).with(stdout_layer).init();
    }

    guard
}
