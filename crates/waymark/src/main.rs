//! Command-line access to the Waymark history store.

use clap::Parser;
use std::io::{self, Write};
use waymark::cli::{Cli, run};

fn main() -> anyhow::Result<()> {
    waymark::init_logging();
    let cli = Cli::parse();
    let stdout = io::stdout();
    let mut out = stdout.lock();
    run(cli, &mut out)?;
    out.flush()?;
    Ok(())
}
