//! Logger initialisation.

use env_logger::Env;

/// Install `env_logger`, honouring `RUST_LOG` and falling back to `level`
/// (or `info`) when it is unset.
///
/// Safe to call more than once; later calls are ignored.
pub fn init(level: Option<&str>) {
    let env = Env::default().default_filter_or(level.unwrap_or("info"));
    let _ = env_logger::Builder::from_env(env)
        .format_timestamp_millis()
        .try_init();
}

/// Install a test logger that writes through the test harness capture.
pub fn init_for_tests() {
    let _ = env_logger::Builder::from_env(Env::default().default_filter_or("debug"))
        .is_test(true)
        .try_init();
}
