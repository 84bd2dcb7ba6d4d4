/*!
 * Logging setup for cliptree
 *
 * Diagnostics go through `tracing` to stderr, leaving stdout to the payload.
 */

use tracing_subscriber::{fmt, EnvFilter};

/// Default filter for a `-v` count; `RUST_LOG` takes precedence
fn default_directive(verbosity: u8, quiet: bool) -> &'static str {
    if quiet {
        return "error";
    }
    match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// Install the stderr subscriber. Does nothing if one is already installed.
pub fn init_logger(verbosity: u8, quiet: bool) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbosity, quiet)));

    let _ = fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
