//! structprompt CLI: render structured prompt definitions to text.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli)
}
