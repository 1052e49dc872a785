use tracing_subscriber::fmt::time::UtcTime;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{fmt, EnvFilter, Registry};

/// Directives used when `RUST_LOG` is unset: queue lifecycle events from this
/// crate and progress from the perf driver, warnings from everything else.
const DEFAULT_DIRECTIVES: &str = "warn,channelqueue=debug,channelqueue_perf=info";

/// Installs the global subscriber. `RUST_LOG` replaces the default
/// directives; `RUST_LOG=channelqueue=trace` shows every coordinator event.
pub fn init_logging() {
    let filter: EnvFilter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVES));

    let formatting_layer = fmt::layer()
        .with_timer(UtcTime::rfc_3339())
        .with_thread_ids(true)
        .with_thread_names(true)
        .with_target(true)
        .compact();

    let subscriber = Registry::default().with(filter).with(formatting_layer);

    if tracing::subscriber::set_global_default(subscriber).is_err() {
        tracing::debug!(target: "channelqueue::logging", "global subscriber already installed");
    }
}
