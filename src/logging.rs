use tracing::info;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan, MakeWriter},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Layer, Registry,
};

use crate::error::{AppError, Result};

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

fn fmt_layer<W>(format: &str, writer: W) -> BoxedLayer
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    match format {
        "json" => fmt::layer()
            .with_writer(writer)
            .with_target(true)
            .with_span_events(FmtSpan::NONE)
            .with_timer(fmt::time::ChronoUtc::rfc_3339())
            .json()
            .boxed(),
        "pretty" => fmt::layer()
            .with_writer(writer)
            .with_target(true)
            .with_timer(fmt::time::ChronoUtc::rfc_3339())
            .pretty()
            .boxed(),
        _ => fmt::layer()
            .with_writer(writer)
            .with_target(false)
            .with_thread_ids(false)
            .with_thread_names(false)
            .with_timer(fmt::time::ChronoUtc::rfc_3339())
            .compact()
            .boxed(),
    }
}

fn install(format: &str, layer: BoxedLayer, default_directive: &str) -> Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

    tracing_subscriber::registry()
        .with(layer)
        .with(env_filter)
        .try_init()
        .map_err(|e| AppError::InternalServerError(format!("Failed to initialize logging: {}", e)))?;

    info!(format, "📝 Structured logging initialized");
    Ok(())
}

/// Server logging on stdout. `format` is `compact` (default), `pretty` or `json`.
pub fn init_logging(format: &str) -> Result<()> {
    install(format, fmt_layer(format, std::io::stdout), "info")
}

/// CLI logging on stderr, so stdout carries only the report.
pub fn init_cli_logging(format: &str) -> Result<()> {
    install(format, fmt_layer(format, std::io::stderr), "warn")
}
