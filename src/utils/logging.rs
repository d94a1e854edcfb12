use log::LevelFilter;

/// Initialize logging for an embedding process (reads RUST_LOG, defaults
/// to info). Safe to call more than once; later calls are no-ops.
pub fn init_logging() {
    let _ = env_logger::Builder::from_default_env()
        .filter_level(LevelFilter::Info)
        .try_init();
}
