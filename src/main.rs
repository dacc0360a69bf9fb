// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.

mod cli;
mod config;
mod metrics;
mod mounts;
mod probe;
mod probe_mode;
mod selfexe;
mod server;

use anyhow::Result;
use clap::Parser;
use cli::Args;
use config::Config;
use log::info;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    if let Some((mode, path)) = args.probe_invocation() {
        // Probe child: stderr is inherited by the exporter, so diagnostics
        // land in its log stream. The exit status is the only result channel.
        simple_logger::init_with_level(log::Level::Info)?;
        std::process::exit(probe_mode::run(mode, path));
    }

    let level = if args.verbose {
        log::Level::Debug
    } else {
        log::Level::Info
    };
    simple_logger::init_with_level(level)?;
    info!(
        "mountprobed starting (version {})",
        env!("CARGO_PKG_VERSION")
    );

    let config = Config::from_args(&args);
    server::run(config).await
}
