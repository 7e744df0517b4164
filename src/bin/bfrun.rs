use std::{
    io::{stdin, stdout},
    path::PathBuf,
};

use anyhow::Context;
use bfstream::driver::run_program;
use clap::Parser;

#[derive(Debug, clap::Parser)]
#[clap(version)]
struct CliOpt {
    #[clap(name = "FILE")]
    file_path: PathBuf,

    #[clap(short = 'e', long = "echo", help = "Print the program before running it")]
    echo: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let opt = CliOpt::parse();

    let code = std::fs::read_to_string(&opt.file_path)
        .with_context(|| format!("Failed to read {}", opt.file_path.display()))?;

    let stdin = stdin();
    let mut stdout = stdout().lock();

    run_program(&code, Box::new(stdin.lock()), &mut stdout, opt.echo).context("bfrun")?;
    Ok(())
}
