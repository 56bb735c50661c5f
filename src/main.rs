use anyhow::Result;
use clap::Parser;

use ritcher_player::cli::Cli;

fn main() -> Result<()> {
    let cli = Cli::parse();
    ritcher_player::run(cli)
}
