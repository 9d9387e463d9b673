mod cli;
mod output;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::LevelFilter;

use crate::cli::Cli;

/// `rust_log` falls back to `info` when absent or malformed; `verbose` raises it to `debug`.
fn log_filter(rust_log: Option<&str>, verbose: bool) -> EnvFilter {
    let filter = rust_log
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new("info"));
    if verbose {
        filter.add_directive(LevelFilter::DEBUG.into())
    } else {
        filter
    }
}

fn init_tracing(verbose: bool) {
    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(rust_log.as_deref(), verbose))
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = cli.chain_config();
    let chain =
        gencert::chain::generate(&config).context("failed to generate certificate chain")?;
    let written = output::write_chain(&cli.out_dir, &chain)?;

    info!(
        certificates = chain.len(),
        files = written.len(),
        out_dir = %cli.out_dir.display(),
        "certificate chain written"
    );
    Ok(())
}
