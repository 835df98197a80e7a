use anyhow::Result;
use clap::Parser;
use env_logger::Env;
use log::error;

pub mod commands;

use commands::{align::Align, command::Command, merge_chunks::MergeChunks};
use enum_dispatch::enum_dispatch;

/// The exit code for invalid arguments and failed commands.
const FAILURE_EXIT_CODE: i32 = -1;

#[derive(Parser, Debug)]
#[command(version)]
struct Args {
    #[clap(subcommand)]
    subcommand: Subcommand,
}

#[enum_dispatch(Command)]
#[derive(Parser, Debug)]
enum Subcommand {
    Align(Align),
    MergeChunks(MergeChunks),
}

fn main() {
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info");
    }
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            // help and version requests are not errors
            let code = if e.use_stderr() { FAILURE_EXIT_CODE } else { 0 };
            let _ = e.print();
            std::process::exit(code);
        }
    };
    if let Err(e) = args.subcommand.execute() {
        error!("{e:#}");
        std::process::exit(FAILURE_EXIT_CODE);
    }
}
