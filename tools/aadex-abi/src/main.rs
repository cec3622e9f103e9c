//! aadex-abi: extract contract ABIs from Hardhat build artifacts
//!
//! Reads the compiled entry point and DEX manager artifacts and writes their
//! `abi` arrays, pretty-printed, to `EntryPoint.abi` and `DexManager.abi`.

use std::env::var;
use std::io::stderr;

use clap::Parser;
use eyre::Result as EyreResult;
use tracing_subscriber::fmt::layer;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{registry, EnvFilter};

mod artifact;
mod cli;
mod config;
mod extract;
mod inspect;

use cli::RootCommand;

fn main() -> EyreResult<()> {
    setup()?;

    let command = RootCommand::parse();

    command.run()
}

fn setup() -> EyreResult<()> {
    let directives = match var("RUST_LOG") {
        Ok(value) if !value.trim().is_empty() => value,
        _ => "aadex_abi=info".to_owned(),
    };

    registry()
        .with(EnvFilter::builder().parse(directives)?)
        .with(layer().with_writer(stderr))
        .init();

    color_eyre::install()?;

    Ok(())
}
