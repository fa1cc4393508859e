use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::debug;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Log levels matching tracing's levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_filter(self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

/// Install the global subscriber. `RUST_LOG` wins over `level`; logs go to
/// stderr so they never interleave with the menu on stdout.
pub fn init_telemetry(level: LogLevel) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.as_filter()));

    let fmt_layer = fmt::layer().with_target(false).with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()?;

    debug!(level = level.as_filter(), "Telemetry initialized");
    Ok(())
}

/// Performance tracking for operations
pub struct PerformanceTracker {
    start_time: Instant,
    operation_name: String,
}

impl PerformanceTracker {
    pub fn new(operation_name: &str) -> Self {
        Self {
            start_time: Instant::now(),
            operation_name: operation_name.to_string(),
        }
    }
}

impl Drop for PerformanceTracker {
    fn drop(&mut self) {
        let duration = self.start_time.elapsed();
        debug!(
            operation = %self.operation_name,
            duration_ms = %duration.as_millis(),
            "Operation completed"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_filters() {
        assert_eq!(LogLevel::Warn.as_filter(), "warn");
        assert_eq!(LogLevel::Trace.as_filter(), "trace");
    }

    #[test]
    fn test_second_init_is_an_error_not_a_panic() {
        let _ = init_telemetry(LogLevel::Error);
        assert!(init_telemetry(LogLevel::Error).is_err());
    }
}
