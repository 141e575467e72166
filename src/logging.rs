//! Tracing subscriber setup for the binary.

use tracing_subscriber::EnvFilter;

/// Initialise the global [`tracing`] subscriber.
///
/// Events go to stderr so stdout stays clean for JSON results.  `RUST_LOG`
/// overrides the default level; `--verbose` lowers it to `debug`.
/// Safe to call more than once; later calls are ignored.
pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_is_idempotent() {
        init(false);
        init(true);
    }
}
