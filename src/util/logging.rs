//! Structured logging setup
//!
//! Installs a `tracing-subscriber` registry once per process. `RUST_LOG`
//! directives are honoured; otherwise the configured level applies to the
//! `flowscout` target and noisy HTTP crates are capped at `warn`. Logs go to
//! stderr so command output on stdout stays machine-readable.
//!
//! ```no_run
//! use flowscout::util::logging;
//!
//! logging::init_from_env();
//! tracing::info!(app = "mailer", "Building repository");
//! ```

use std::env;
use std::sync::Once;
use tracing::Level;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const LEVEL_ENV: &str = "FLOWSCOUT_LOG_LEVEL";
const JSON_ENV: &str = "FLOWSCOUT_LOG_JSON";

const QUIET_DEPENDENCIES: &[&str] = &["h2=warn", "hyper=warn", "reqwest=warn", "genai=warn"];

static INIT: Once = Once::new();

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Minimum level for flowscout's own events
    pub level: Level,

    /// JSON lines instead of human-readable output
    pub use_json: bool,

    pub include_target: bool,

    /// File and line of each event
    pub include_location: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            use_json: false,
            include_target: true,
            include_location: false,
        }
    }
}

impl LoggingConfig {
    pub fn with_level(level: Level) -> Self {
        Self::default().level(level)
    }

    /// `FLOWSCOUT_LOG_LEVEL` (default `info`) and `FLOWSCOUT_LOG_JSON`
    /// (`true`/`false`, default pretty output)
    pub fn from_env() -> Self {
        let level = env::var(LEVEL_ENV)
            .map(|l| parse_level(&l))
            .unwrap_or(Level::INFO);

        let use_json = env::var(JSON_ENV)
            .ok()
            .and_then(|v| v.trim().parse::<bool>().ok())
            .unwrap_or(false);

        Self {
            level,
            use_json,
            ..Self::default()
        }
    }

    /// Keeps the other settings, replacing only the level
    pub fn level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }
}

/// Parses a level name; unknown names fall back to `INFO` with a notice on
/// stderr, since logging may not be up yet.
pub fn parse_level(level_str: &str) -> Level {
    match level_str.trim().to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" | "warning" => Level::WARN,
        "error" => Level::ERROR,
        other => {
            eprintln!(
                "Unknown log level '{}', using info (trace, debug, info, warn, error)",
                other
            );
            Level::INFO
        }
    }
}

fn build_filter(level: Level) -> EnvFilter {
    let user_directives = env::var("RUST_LOG").is_ok();
    let mut directives: Vec<String> = vec![format!("flowscout={}", level)];
    if !user_directives {
        directives.extend(QUIET_DEPENDENCIES.iter().map(|d| d.to_string()));
    }

    directives
        .iter()
        .filter_map(|d| d.parse().ok())
        .fold(EnvFilter::from_default_env(), |filter, directive| {
            filter.add_directive(directive)
        })
}

/// Installs the global subscriber. Only the first call has any effect.
pub fn init_logging(config: LoggingConfig) {
    INIT.call_once(|| {
        let json_layer = config.use_json.then(|| {
            fmt::layer()
                .json()
                .with_writer(std::io::stderr)
                .with_target(config.include_target)
                .with_file(config.include_location)
                .with_line_number(config.include_location)
        });
        let text_layer = (!config.use_json).then(|| {
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(config.include_target)
                .with_file(config.include_location)
                .with_line_number(config.include_location)
        });

        let installed = tracing_subscriber::registry()
            .with(build_filter(config.level))
            .with(json_layer)
            .with(text_layer)
            .try_init();

        if let Err(e) = installed {
            eprintln!("Logging already initialized: {}", e);
        }
    });
}

pub fn init_from_env() {
    init_logging(LoggingConfig::from_env());
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use yare::parameterized;

    #[parameterized(
        trace = { "trace", Level::TRACE },
        debug_mixed_case = { "Debug", Level::DEBUG },
        info_upper = { "INFO", Level::INFO },
        warning_alias = { "warning", Level::WARN },
        error = { " error ", Level::ERROR },
        unknown = { "verbose", Level::INFO },
        empty = { "", Level::INFO },
    )]
    fn test_parse_level(raw: &str, expected: Level) {
        assert_eq!(parse_level(raw), expected);
    }

    #[test]
    fn test_with_level_keeps_defaults() {
        let config = LoggingConfig::with_level(Level::DEBUG);
        assert_eq!(config.level, Level::DEBUG);
        assert!(!config.use_json);
        assert!(config.include_target);
    }

    #[test]
    #[serial]
    fn test_from_env() {
        env::set_var(LEVEL_ENV, "debug");
        env::set_var(JSON_ENV, "true");
        let config = LoggingConfig::from_env();
        env::remove_var(LEVEL_ENV);
        env::remove_var(JSON_ENV);

        assert_eq!(config.level, Level::DEBUG);
        assert!(config.use_json);
        assert_eq!(config.level(Level::ERROR).level, Level::ERROR);
    }

    #[test]
    #[serial]
    fn test_from_env_defaults() {
        env::remove_var(LEVEL_ENV);
        env::remove_var(JSON_ENV);

        let config = LoggingConfig::from_env();
        assert_eq!(config.level, Level::INFO);
        assert!(!config.use_json);
    }

    #[test]
    fn test_init_logging_twice_is_harmless() {
        init_logging(LoggingConfig::default());
        init_logging(LoggingConfig::with_level(Level::DEBUG));
    }
}
