use log::LevelFilter;

/// Level for the `wordbrain` crate's own records.
fn crate_level(debug_enabled: bool) -> LevelFilter {
    if debug_enabled {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    }
}

/// Initialize logging for the `wordbrain` binaries.
///
/// The solver's own records go out at `Info`, or `Debug` if `debug_enabled`
/// is true; other crates only report warnings. A `RUST_LOG` setting takes
/// precedence over both. Safe to call more than once.
pub fn init_logger(debug_enabled: bool) {
    let level = crate_level(debug_enabled);

    let mut builder = env_logger::Builder::new();
    builder
        .filter(None, LevelFilter::Warn)
        .filter(Some(env!("CARGO_CRATE_NAME")), level)
        .format_timestamp(None)
        .format_module_path(false)
        .format_target(false);

    if let Ok(spec) = std::env::var("RUST_LOG") {
        builder.parse_filters(&spec);
    }

    // a second call (e.g. from a test harness) keeps the first logger
    if builder.try_init().is_ok() {
        log::debug!("Logger initialized, wordbrain records at {level:?}");
    }
}
