use clap::ValueEnum;
use tracing_subscriber::EnvFilter;

/// Directives in this variable (`EnvFilter` syntax) take precedence over `--log-level`.
pub const LOG_ENV: &str = "FRAMECAST_LOG";

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn directive(self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

fn build_filter(env: Option<&str>, level: LogLevel) -> EnvFilter {
    env.filter(|directives| !directives.trim().is_empty())
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new(level.directive()))
}

/// Install the stderr subscriber.
///
/// Thread names are included so lines from the `framecast-ingest` thread can
/// be told apart from the presenting loop on the main thread.
pub fn init_logging(format: LogFormat, level: LogLevel) {
    let env = std::env::var(LOG_ENV).ok();
    let builder = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(build_filter(env.as_deref(), level))
        .with_thread_names(true)
        .with_ansi(false)
        .with_target(false);

    // A second init (tests, embedding) keeps the first subscriber.
    let _ = match format {
        LogFormat::Text => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flag_level_applies_without_env() {
        assert_eq!(build_filter(None, LogLevel::Debug).to_string(), "debug");
        assert_eq!(build_filter(Some("  "), LogLevel::Warn).to_string(), "warn");
    }

    #[test]
    fn env_directives_override_flag() {
        let filter = build_filter(Some("framecast_ingest=trace"), LogLevel::Error);
        assert_eq!(filter.to_string(), "framecast_ingest=trace");
    }

    #[test]
    fn unparsable_env_falls_back_to_flag() {
        let filter = build_filter(Some("framecast_ingest=loud"), LogLevel::Info);
        assert_eq!(filter.to_string(), "info");
    }
}
