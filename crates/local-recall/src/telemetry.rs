// local-recall/crates/local-recall/src/telemetry.rs

use tracing_subscriber::{fmt, EnvFilter};

/// Install the global tracing subscriber. Honors RUST_LOG, defaulting to
/// info for this crate and warn elsewhere. Safe to call more than once;
/// later calls keep the first subscriber.
pub fn init_tracing() {
    let env_filter =
        std::env::var("RUST_LOG").unwrap_or_else(|_| "warn,local_recall=info".into());

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(env_filter))
        .with_timer(fmt::time::UtcTime::rfc_3339())
        .with_target(true)
        .with_level(true)
        .compact()
        .finish();

    let _ = tracing::subscriber::set_global_default(subscriber);
}
