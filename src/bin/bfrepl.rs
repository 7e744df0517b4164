use std::io::{stdin, stdout, Write};

use anyhow::Context;
use bfstream::{
    bfvm::BfVM,
    console::{ConsoleInput, LineEditor},
    driver::{run_program, Command, BANNER, DEMO_PROGRAM},
};
use clap::Parser;

#[derive(Debug, clap::Parser)]
#[clap(version)]
struct CliOpt {
    #[clap(short = 'p', long = "prompt", default_value = ">>>")]
    prompt: String,

    #[clap(
        short = 'e',
        long = "echo",
        help = "Redraw typed lines, for consoles without local echo"
    )]
    echo: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let opt = CliOpt::parse();

    let editor = LineEditor::new(opt.prompt, opt.echo);
    let mut keys = ConsoleInput::new(stdin());
    let mut vm = BfVM::new(Box::new(keys.clone()), Box::new(stdout()));

    println!("{BANNER}");

    'main_loop: loop {
        let line = {
            let mut stdout = stdout().lock();
            let line = editor
                .read_line(&mut keys, &mut stdout)
                .context("Failed to read line")?;
            if opt.echo {
                writeln!(stdout)?;
            }
            line
        };

        let Some(line) = line else {
            break 'main_loop;
        };

        match Command::parse(&line) {
            Command::Reset => {
                vm.reset();
                println!("\n{BANNER}");
            }
            Command::Example => {
                let mut stdout = stdout().lock();
                let ret = run_program(DEMO_PROGRAM, Box::new(std::io::empty()), &mut stdout, true);
                if let Err(e) = ret {
                    eprintln!("Error: {}", e);
                }
                vm.reset();
            }
            Command::Program(code) => {
                let ret = vm.feed_str(code).and_then(|()| vm.flush());
                println!();
                if let Err(e) = ret {
                    eprintln!("Error: {}", e);
                    continue 'main_loop;
                }
                log::debug!(
                    "pointer {}, {} instructions logged, {} open loops, skip depth {}",
                    vm.tape().ptr(),
                    vm.instructions().len(),
                    vm.open_loops().len(),
                    vm.skip_depth()
                );
            }
        }
    }

    Ok(())
}
