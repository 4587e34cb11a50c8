use anyhow::Result;
use clap::Parser;
use env_logger::{Builder, Env};
use log::error;

mod cli;
mod cmd_build;
mod cmd_info;
mod cmd_merge;
mod cmd_query;
mod util;

fn init_logger() {
    // RUST_LOG overrides, e.g. RUST_LOG=debug hyperbloom build ...
    Builder::from_env(Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();
}

fn main() {
    init_logger();

    if let Err(e) = run() {
        error!("{:#}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = cli::Cli::parse();
    match cli.cmd {
        cli::Cmd::Build {
            out,
            geometry,
            keys,
            key,
        } => cmd_build::exec(out, geometry, keys, key),

        cli::Cmd::Query {
            filter,
            keys,
            key,
            json,
        } => cmd_query::exec(filter, keys, key, json),

        cli::Cmd::Merge { into, from } => cmd_merge::exec(into, from),

        cli::Cmd::Info { filter, json } => cmd_info::exec(filter, json),
    }
}
