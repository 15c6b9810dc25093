//! Tracing setup shared by the credmirror binaries.
//!
//! Events go to stdout, filtered by `RUST_LOG`. When [`OTLP_URL_ENVVAR`] is set, spans are also
//! exported to that OpenTelemetry collector under the service's whoami string.

use std::env;

use opentelemetry::{trace::TracerProvider, KeyValue};
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::{trace::SdkTracerProvider, Resource};
use thiserror::Error;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Environment variable holding the OTLP collector endpoint.
pub const OTLP_URL_ENVVAR: &str = "CREDMIRROR_OTLP_URL";

/// Environment variable holding a label that tells replicas of one service apart.
pub const SVC_LABEL_ENVVAR: &str = "CREDMIRROR_SVC_LABEL";

/// Instrumentation scope of exported spans.
const TRACER_NAME: &str = "credmirror";

/// Failure to install the logging subsystem.
#[derive(Debug, Error)]
pub enum LoggingError {
    /// The OTLP exporter could not be built.
    #[error("otlp exporter: {0}")]
    Exporter(String),

    /// A global subscriber is already installed.
    #[error("subscriber: {0}")]
    Install(#[from] tracing_subscriber::util::TryInitError),
}

/// How a service identifies itself and where its spans go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggerConfig {
    whoami: String,
    otlp_url: Option<String>,
    with_file: bool,
    with_line_number: bool,
}

impl LoggerConfig {
    /// Configuration for `service`, completed from the environment.
    ///
    /// Reads [`SVC_LABEL_ENVVAR`] and [`OTLP_URL_ENVVAR`], plus `LOG_FILE=1` and
    /// `LOG_LINE_NUM=1` to annotate events with their source location.
    pub fn from_env(service: &str) -> Self {
        let flag = |name: &str| env::var(name).is_ok_and(|v| v == "1");

        Self {
            whoami: whoami(service, env::var(SVC_LABEL_ENVVAR).ok().as_deref()),
            otlp_url: env::var(OTLP_URL_ENVVAR).ok(),
            with_file: flag("LOG_FILE"),
            with_line_number: flag("LOG_LINE_NUM"),
        }
    }

    /// The name this service logs and exports under.
    pub fn whoami(&self) -> &str {
        &self.whoami
    }

    /// Exports spans to `url` instead of the collector named by the environment, if any.
    pub fn with_otlp_url(mut self, url: impl Into<String>) -> Self {
        self.otlp_url = Some(url.into());
        self
    }
}

/// `service`, or `service%label` for a labelled replica.
fn whoami(service: &str, label: Option<&str>) -> String {
    match label {
        Some(label) if !label.is_empty() => format!("{service}%{label}"),
        _ => service.to_owned(),
    }
}

fn tracer_provider(config: &LoggerConfig, url: &str) -> Result<SdkTracerProvider, LoggingError> {
    let exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_tonic()
        .with_endpoint(url)
        .build()
        .map_err(|err| LoggingError::Exporter(err.to_string()))?;

    let resource = Resource::builder()
        .with_attribute(KeyValue::new("service.name", config.whoami.clone()))
        .build();

    Ok(SdkTracerProvider::builder()
        .with_resource(resource)
        .with_batch_exporter(exporter)
        .build())
}

/// Installs the global subscriber described by `config`.
pub fn init(config: LoggerConfig) -> Result<(), LoggingError> {
    let stdout = tracing_subscriber::fmt::layer()
        .compact()
        .event_format(
            tracing_subscriber::fmt::format()
                .with_file(config.with_file)
                .with_line_number(config.with_line_number),
        )
        .with_filter(EnvFilter::from_default_env());

    let otlp = config
        .otlp_url
        .as_deref()
        .map(|url| tracer_provider(&config, url))
        .transpose()?
        .map(|provider| tracing_opentelemetry::layer().with_tracer(provider.tracer(TRACER_NAME)));

    tracing_subscriber::registry()
        .with(stdout)
        .with(otlp)
        .try_init()?;

    info!(whoami = %config.whoami, otlp = ?config.otlp_url, "logging started");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labelled_replicas_get_distinct_names() {
        assert_eq!(whoami("credmirror-relayer", None), "credmirror-relayer");
        assert_eq!(whoami("credmirror-relayer", Some("")), "credmirror-relayer");
        assert_eq!(
            whoami("credmirror-relayer", Some("eu-1")),
            "credmirror-relayer%eu-1"
        );
    }

    #[test]
    fn explicit_collector_overrides_environment() {
        let config = LoggerConfig::from_env("dev-ledger").with_otlp_url("http://localhost:4317");

        assert!(config.whoami().starts_with("dev-ledger"));
        assert_eq!(config.otlp_url.as_deref(), Some("http://localhost:4317"));
    }
}
