// Logging setup (tracing + tracing-subscriber)
//
// RUST_LOG overrides the default filter, e.g. RUST_LOG=coffee_dms=debug.
// Output goes to stderr so it never mixes with menu text on stdout.

use tracing_subscriber::{fmt, EnvFilter};

/// Initialise the global subscriber.
///
/// `default_filter` applies when RUST_LOG is unset: the text menu uses
/// "warn" (skipped import lines stay visible), the terminal UI uses "off"
/// because stray output would tear the alternate screen.
pub fn init(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter));

    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_line_number(true)
        .init();
}

/// Verbose logging for tests; safe to call more than once
pub fn init_test() {
    let _ = fmt()
        .with_env_filter(EnvFilter::new("debug"))
        .with_test_writer()
        .try_init();
}
