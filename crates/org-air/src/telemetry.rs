use crate::config::TelemetryConfig;
use crate::scoring::ScoringRun;
use std::fmt;
use tracing::{info_span, Span};
use tracing_subscriber::filter::ParseError;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::EnvFilter;

/// Level applied to dependencies when the configured value is a bare level.
const DEPENDENCY_LEVEL: &str = "warn";
const SCORING_TARGETS: [&str; 2] = ["org_air", "org_air_api"];

#[derive(Debug)]
pub enum TelemetryError {
    EnvFilter { value: String, source: ParseError },
    Subscriber(Box<dyn std::error::Error + Send + Sync>),
}

impl fmt::Display for TelemetryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TelemetryError::EnvFilter { value, .. } => {
                write!(f, "APP_LOG_LEVEL '{value}' is not a valid scoring log filter")
            }
            TelemetryError::Subscriber(err) => {
                write!(f, "could not install scoring log subscriber: {err}")
            }
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

/// Expand a bare level into per-crate directives so scoring logs are not
/// drowned by the HTTP stack. Full filter expressions pass through as given.
pub fn filter_directives(log_level: &str) -> String {
    let level = match log_level.trim() {
        "" => "info",
        level => level,
    };
    if level.contains('=') || level.contains(',') {
        return level.to_string();
    }
    let mut directives = vec![DEPENDENCY_LEVEL.to_string()];
    directives.extend(SCORING_TARGETS.iter().map(|target| format!("{target}={level}")));
    directives.join(",")
}

/// Install the global fmt subscriber. `RUST_LOG` wins over the configured
/// level. Closing a `scoring_run` span logs its duration.
pub fn init(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(filter_directives(&config.log_level)).map_err(|source| {
            TelemetryError::EnvFilter {
                value: config.log_level.clone(),
                source,
            }
        })?,
    };

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_span_events(FmtSpan::CLOSE)
        .compact()
        .with_ansi(false)
        .try_init()
        .map_err(TelemetryError::Subscriber)
}

/// Span carried by every log line of one batch, including the lines emitted
/// from rayon workers.
pub fn run_span(run: &ScoringRun, companies: usize) -> Span {
    info_span!(
        "scoring_run",
        run_id = %run.id,
        model_version = %run.model_version,
        companies
    )
}
