mod bootstrap;
mod cli;
mod paths;
mod presets;
mod run;

use anyhow::Result;

fn main() -> Result<()> {
    let args = cli::parse();
    run::run(args)
}
