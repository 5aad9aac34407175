//! Tracing subscriber setup for the `dtflat` binary
//!
//! Filtering follows `RUST_LOG`; without it the given default directive is
//! used. Output goes to stderr so that stdout stays free for tree dumps.

use tracing_subscriber::EnvFilter;

/// Log line format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable lines
    #[default]
    Text,
    /// One JSON object per event
    Json,
}

/// Build the filter from `RUST_LOG`, falling back to `default_directive`
///
/// # Errors
/// Returns error if `default_directive` does not parse
pub fn env_filter(default_directive: &str) -> Result<EnvFilter, LoggingError> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(default_directive)
            .map_err(|e| LoggingError::Directive(e.to_string())),
    }
}

/// Install the global subscriber
///
/// # Errors
/// Returns error if the filter is invalid or a subscriber is already set
pub fn init(format: LogFormat, default_directive: &str) -> Result<(), LoggingError> {
    let filter = env_filter(default_directive)?;
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);
    let result = match format {
        LogFormat::Text => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    result.map_err(|e| LoggingError::Init(e.to_string()))
}

/// Logging setup errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LoggingError {
    /// Filter directive did not parse
    #[error("invalid log filter: {0}")]
    Directive(String),

    /// Global subscriber already installed
    #[error("failed to install subscriber: {0}")]
    Init(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bad_directive_is_reported() {
        if std::env::var_os("RUST_LOG").is_none() {
            assert!(matches!(
                env_filter("dtflat=verbose"),
                Err(LoggingError::Directive(_))
            ));
        }
    }

    #[test]
    fn second_init_fails() {
        let _ = init(LogFormat::Text, "warn");
        assert!(matches!(
            init(LogFormat::Json, "warn"),
            Err(LoggingError::Init(_))
        ));
    }
}
