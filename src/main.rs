use clap::Parser;
use gpx_track_cleaner::{batch, Config};
use tracing::debug;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::parse();
    init_logging(config.verbose);
    debug!("{:?}", config);

    batch::run(&config)?;
    Ok(())
}

/// RUST_LOG wins when set; otherwise INFO, or DEBUG with --verbose.
/// Logs go to stderr so the summary on stdout stays clean.
fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
