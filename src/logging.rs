use tracing_subscriber::EnvFilter;

/// Installs the global subscriber. `RUST_LOG` is only honored when `debug`
/// is set, otherwise the level is pinned to `info`. Calling it twice is a
/// no-op.
pub fn init(debug: bool) {
    let filter = if debug {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("rasterpad=debug,info"))
    } else {
        EnvFilter::new("info")
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}
