use anyhow::Result;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod cli;

fn main() -> Result<()> {
    let args = cli::parse_args();

    let default_directive = if args.verbose {
        "linkdive=debug"
    } else {
        "linkdive=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive)),
        )
        .init();

    info!("Starting linkdive v{}", env!("CARGO_PKG_VERSION"));

    match cli::process_command(args) {
        Ok(_) => Ok(()),
        Err(e) => {
            error!("Crawl failed: {:#}", e);
            Err(e)
        }
    }
}
