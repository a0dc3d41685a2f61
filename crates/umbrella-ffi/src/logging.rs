use std::sync::Once;

use tracing_subscriber::EnvFilter;

/// Environment variable holding a `tracing` filter directive for hosts.
pub const LOG_ENV: &str = "UMBRELLA_LOG";

/// Install a stderr subscriber once per process.
///
/// Leaves an existing global subscriber in place if the host already set one.
pub fn install() {
    static INSTALL: Once = Once::new();
    INSTALL.call_once(|| {
        let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .try_init();
    });
}
