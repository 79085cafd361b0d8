//! Tracing subscriber setup for the command line tool.

use std::sync::Once;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Environment variable holding an `EnvFilter` directive, e.g.
/// `RUST_EDMX_LOG=rust_edmx::views=trace`.
pub const LOG_ENV: &str = "RUST_EDMX_LOG";

static INIT: Once = Once::new();

/// Default directive when `RUST_EDMX_LOG` is unset or invalid.
pub fn default_directive(verbose: bool) -> &'static str {
    if verbose {
        "rust_edmx=debug"
    } else {
        "rust_edmx=warn"
    }
}

/// Install a stderr subscriber. Later calls are no-ops.
pub fn init_tracing(verbose: bool) {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_env(LOG_ENV)
            .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose)));

        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(verbose),
            )
            .with(filter)
            .init();
    });
}
