//! Tracing setup

use tracing_subscriber::{
    fmt::format::Format, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter,
};

const DEFAULT_FILTER: &str = "mediagate=debug,tower_http=debug";

/// Install the global subscriber.
///
/// `log_format` selects `json` (one object per event) or the compact console format.
/// `RUST_LOG` overrides the default filter.
pub fn init_telemetry(log_format: &str) -> Result<(), Box<dyn std::error::Error>> {
    let json = log_format.eq_ignore_ascii_case("json");

    let json_layer = json.then(|| tracing_subscriber::fmt::layer().json().with_current_span(true));
    let console_layer = (!json).then(|| {
        tracing_subscriber::fmt::layer().event_format(
            Format::default()
                .compact()
                .with_target(false)
                .without_time(),
        )
    });

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_FILTER.into()))
        .with(json_layer)
        .with(console_layer)
        .try_init()?;

    tracing::info!(log_format = %log_format, "Tracing initialized");
    Ok(())
}
