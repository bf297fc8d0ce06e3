//! Diagnostic logging via `tracing`.
//!
//! Logs go to stderr so stdout stays reserved for command output (EXIF JSON,
//! data URLs, progress lines). `RUST_LOG` overrides the level chosen here.

use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Default directive when `RUST_LOG` is unset.
fn default_directive(verbose: bool) -> &'static str {
    if verbose {
        "photo_ingest=debug,info"
    } else {
        "photo_ingest=info,warn"
    }
}

/// Install the global subscriber.
///
/// `json_format` switches to one JSON object per line for log shippers.
/// Calling this twice is harmless; the second install is ignored.
pub fn init(verbose: bool, json_format: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose)));

    let registry = tracing_subscriber::registry().with(filter);
    let result = if json_format {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init()
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_writer(std::io::stderr),
            )
            .try_init()
    };
    if result.is_err() {
        tracing::debug!("logging already initialised");
    }
}
