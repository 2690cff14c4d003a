//! Logging setup.
//!
//! Logs go to stderr so they never interleave with operator prompts on stdout.
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Filter directive for a `-v` count; `RUST_LOG` wins when set.
pub fn level_for(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

pub fn init_logging(verbose: u8) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = level_for(verbose);
        EnvFilter::new(format!("lms_groupadmin={level},groupadm={level}"))
    });

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(verbose >= 2)
        .with_line_number(verbose >= 3)
        .try_init();

    debug!(verbose, "logging initialized");
}
