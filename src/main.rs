// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use anyhow::{anyhow, bail, Context, Result};
use std::env;
use std::path::PathBuf;
use std::process;

use xlean_bridge::backends::native::KernelHandle;
use xlean_bridge::backends::repl::ReplProcess;
use xlean_bridge::config::consts::CONFIG_ENV_VAR;
use xlean_bridge::config::{load_config, BridgeConfig};
use xlean_bridge::engine::ForegroundLoop;
use xlean_bridge::observability::init_tracing;
use xlean_bridge::protocol::StdioProtocolFactory;
use xlean_bridge::session::SessionState;

const USAGE: &str = "Usage: xlean [-f] <connection-file> [--config <bridge.yaml>]";

/// Parsed command line.
struct Args {
    connection_file: PathBuf,
    config_file: Option<PathBuf>,
}

fn parse_args(mut args: impl Iterator<Item = String>) -> Result<Args> {
    let mut connection_file = None;
    let mut config_file = None;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            // Jupyter kernel specs pass the connection file as `-f {connection_file}`
            "-f" => {
                connection_file = Some(args.next().ok_or_else(|| anyhow!("-f needs a path"))?);
            }
            "--config" => {
                config_file = Some(args.next().ok_or_else(|| anyhow!("--config needs a path"))?);
            }
            "-h" | "--help" => bail!(USAGE),
            other if connection_file.is_none() && !other.starts_with('-') => {
                connection_file = Some(other.to_string());
            }
            other => bail!("Unexpected argument '{other}'\n{USAGE}"),
        }
    }

    Ok(Args {
        connection_file: connection_file.map(PathBuf::from).ok_or_else(|| anyhow!(USAGE))?,
        config_file: config_file
            .or_else(|| env::var(CONFIG_ENV_VAR).ok())
            .map(PathBuf::from),
    })
}

fn bridge_config(path: Option<&PathBuf>) -> Result<BridgeConfig> {
    match path {
        Some(path) => load_config(path)
            .with_context(|| format!("Failed to load bridge config from {}", path.display())),
        None => Ok(BridgeConfig::default()),
    }
}

fn run(args: Args) -> Result<()> {
    let config = bridge_config(args.config_file.as_ref())?;

    // The protocol thread owns stdin once the handle exists, so nothing may
    // fail between creating the handle and entering the foreground loop.
    let evaluator = ReplProcess::spawn(&config.repl).context("Failed to start the evaluator")?;
    let handle = KernelHandle::try_create(&args.connection_file, &StdioProtocolFactory, &config)
        .with_context(|| format!("Failed to start kernel from {}", args.connection_file.display()))?;

    let session = ForegroundLoop::new(&handle, evaluator, config.poll_timeout()).run(SessionState::new());
    tracing::info!(evaluations = session.evaluations(), "Kernel exiting");

    // Joins the protocol thread
    drop(handle);
    Ok(())
}

fn main() {
    init_tracing();

    if let Err(e) = parse_args(env::args().skip(1)).and_then(run) {
        eprintln!("xlean: {e:#}");
        process::exit(1);
    }
}
