// Entrypoint for the CLI application.
// - Keeps `main` small: parse arguments, set up logging, run the import.
// - Returns `anyhow::Result` so errors are printed with their context.

use clap::Parser;
use csv2db::cli::{init_logging, run, Cli};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(&cli)?;

    run(cli)
}
