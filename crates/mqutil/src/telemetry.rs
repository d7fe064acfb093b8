use tracing_log::LogTracer;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_DIRECTIVES: &str = "info";

/// Install the process-wide subscriber for the `mqutil` binary.
///
/// Diagnostics go to stderr; stdout is reserved for listings and received
/// messages so they can be piped. `RUST_LOG` overrides the default `info`
/// level, e.g. `RUST_LOG=mqutil=debug` to see session open/close and stream
/// shutdown. The relay logs through `log`, which is bridged in here.
///
/// Calling it again is a no-op.
pub fn init() {
    let _ = LogTracer::init();

    let fmt_layer = fmt::layer()
        .with_target(true)
        .with_writer(std::io::stderr)
        .compact();

    let _ = tracing_subscriber::registry()
        .with(filter(std::env::var(EnvFilter::DEFAULT_ENV).ok()))
        .with(fmt_layer)
        .try_init();
}

fn filter(directives: Option<String>) -> EnvFilter {
    directives
        .and_then(|d| EnvFilter::try_new(d).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_DIRECTIVES))
}
