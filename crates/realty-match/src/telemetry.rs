use crate::config::TelemetryConfig;
use std::fmt;
use tracing_subscriber::filter::ParseError;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::EnvFilter;

/// Noisy dependency targets held at `warn` unless `RUST_LOG` says otherwise.
const QUIET_TARGETS: [&str; 2] = ["hyper", "tower_http"];

#[derive(Debug)]
pub enum TelemetryError {
    EnvFilter { value: String, source: ParseError },
    Subscriber(Box<dyn std::error::Error + Send + Sync>),
}

impl fmt::Display for TelemetryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TelemetryError::EnvFilter { value, .. } => {
                write!(f, "invalid log filter '{value}' in APP_LOG_LEVEL")
            }
            TelemetryError::Subscriber(err) => write!(f, "subscriber already installed: {err}"),
        }
    }
}

impl std::error::Error for TelemetryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TelemetryError::EnvFilter { source, .. } => Some(source),
            TelemetryError::Subscriber(err) => Some(&**err),
        }
    }
}

/// Expands the configured level into a directive list, quieting transport crates.
pub fn filter_directives(config: &TelemetryConfig) -> String {
    let base = config.log_level.trim();
    let base = if base.is_empty() { "info" } else { base };

    let mut directives = vec![base.to_string()];
    for target in QUIET_TARGETS {
        if !base.contains(target) {
            directives.push(format!("{target}=warn"));
        }
    }
    directives.join(",")
}

pub fn init(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    install(config, std::io::stdout)
}

/// Same subscriber as [`init`], writing to stderr so stdout stays free for command output.
pub fn init_stderr(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    install(config, std::io::stderr)
}

fn install<W>(config: &TelemetryConfig, writer: W) -> Result<(), TelemetryError>
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => {
            let directives = filter_directives(config);
            EnvFilter::try_new(&directives).map_err(|source| TelemetryError::EnvFilter {
                value: config.log_level.clone(),
                source,
            })?
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .compact()
        .with_ansi(false)
        .with_writer(writer)
        .try_init()
        .map_err(TelemetryError::Subscriber)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directives_quiet_transport_targets() {
        let config = TelemetryConfig {
            log_level: "debug".to_string(),
        };
        assert_eq!(filter_directives(&config), "debug,hyper=warn,tower_http=warn");
    }

    #[test]
    fn explicit_target_directives_are_left_alone() {
        let config = TelemetryConfig {
            log_level: "info,hyper=trace".to_string(),
        };
        assert_eq!(
            filter_directives(&config),
            "info,hyper=trace,tower_http=warn"
        );
    }

    #[test]
    fn blank_level_falls_back_to_info() {
        let config = TelemetryConfig {
            log_level: "  ".to_string(),
        };
        assert!(filter_directives(&config).starts_with("info,"));
    }

    #[test]
    fn stderr_subscriber_installs_once() {
        let config = TelemetryConfig {
            log_level: "warn".to_string(),
        };

        assert!(init_stderr(&config).is_ok());
        assert!(matches!(
            init_stderr(&config),
            Err(TelemetryError::Subscriber(_))
        ));
    }
}
