use anyhow::Result;
use clap::Parser;

mod args;
mod cmd;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = args::Cli::parse();
    cmd::dispatch(cli)
}
