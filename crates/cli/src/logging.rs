//! Logging backend for the CLI.
//!
//! The engine logs through the `log` facade; the fmt subscriber installed here
//! also bridges those records, so one filter controls both. Output goes to
//! stderr to keep `--json` stdout clean.

use tracing_subscriber::EnvFilter;

/// Environment variable holding an `EnvFilter` directive, e.g. `debug` or
/// `scancount_recon=trace`.
pub const LOG_ENV: &str = "SCANCOUNT_LOG";

pub fn default_directive(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    }
}

/// Install the global subscriber. `SCANCOUNT_LOG` wins over `-v`.
pub fn init(verbose: u8) {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose)));

    // a second init (tests) is harmless
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .try_init();
}
