use tracing_error::ErrorLayer;
use tracing_subscriber::{EnvFilter, Registry, fmt, layer::SubscriberExt};

/// Level filter override; falls back to `RUST_LOG`, then `info`.
const LEVEL_VAR: &str = "SENTINEL_LOG_LEVEL";
/// Set to `json` for machine-readable lines; anything else keeps the
/// human-readable formatter.
const FORMAT_VAR: &str = "SENTINEL_LOG_FORMAT";

/// Install the global tracing subscriber for the notifier binary.
///
/// CI runs usually keep the plain formatter; `SENTINEL_LOG_FORMAT=json`
/// switches to JSON lines for log collectors. Call once at startup.
pub fn init_tracing() {
    let filter = level_filter();
    let json = std::env::var(FORMAT_VAR)
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    // The JSON and plain formatters are distinct types, so each branch
    // assembles and installs its own stack.
    if json {
        let stack = Registry::default()
            .with(filter)
            .with(fmt::layer().json().with_target(false))
            .with(ErrorLayer::default());
        tracing::subscriber::set_global_default(stack)
            .expect("failed to set global tracing subscriber");
    } else {
        let stack = Registry::default()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_file(true)
                    .with_line_number(true),
            )
            .with(ErrorLayer::default());
        tracing::subscriber::set_global_default(stack)
            .expect("failed to set global tracing subscriber");
    }
}

fn level_filter() -> EnvFilter {
    match std::env::var(LEVEL_VAR) {
        Ok(directive) => EnvFilter::new(directive),
        Err(_) => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    }
}
