//! Line-level control around the VM: session commands, the bundled demo
//! and one-shot program runs.

use std::io::{Read, Write};

use crate::{bfvm::BfVM, errors::VMError};

pub const BANNER: &str = concat!(
    "bfstream v",
    env!("CARGO_PKG_VERSION"),
    "\n  type reset to clear vm states\n  type example to see an example\n"
);

/// Prints "Hello World!" followed by a newline.
pub const DEMO_PROGRAM: &str = "++++++++[>++++[>++>+++>+++>+<<<<-]>+>+>->>+[<]<-]>>.>---.\
+++++++..+++.>>.<-.<.+++.------.--------.>>+.>++.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command<'a> {
    /// Start over with a fresh session.
    Reset,
    /// Run [`DEMO_PROGRAM`], then start over.
    Example,
    /// Feed the line into the running session.
    Program(&'a str),
}

impl<'a> Command<'a> {
    pub fn parse(line: &'a str) -> Self {
        match line.trim() {
            "reset" => Command::Reset,
            "example" => Command::Example,
            _ => Command::Program(line),
        }
    }
}

/// Runs `src` start to finish in a VM of its own. With `echo`, the program
/// text is printed before it runs.
pub fn run_program(
    src: &str,
    input: Box<dyn Read + '_>,
    output: &mut dyn Write,
    echo: bool,
) -> Result<(), VMError> {
    if echo {
        writeln!(output, "{src}\n")?;
    }

    let mut vm = BfVM::new(input, Box::new(&mut *output));
    vm.feed_str(src)?;
    log::debug!(
        "program done: {} instructions, pointer at {}",
        vm.instructions().len(),
        vm.tape().ptr()
    );
    if !vm.open_loops().is_empty() || vm.is_skipping() {
        log::warn!("program ended inside a loop");
    }
    vm.flush()?;
    drop(vm);

    writeln!(output)?;
    output.flush()?;
    Ok(())
}

#[test]
fn test_parse_command() {
    assert_eq!(Command::parse("reset"), Command::Reset);
    assert_eq!(Command::parse("  example \r"), Command::Example);
    assert_eq!(Command::parse("+++."), Command::Program("+++."));
    assert_eq!(Command::parse("reset+"), Command::Program("reset+"));
    assert_eq!(Command::parse(""), Command::Program(""));
}

#[test]
fn test_run_program() {
    let mut out = vec![];
    run_program(",+.", Box::new(&b"a"[..]), &mut out, false).unwrap();
    assert_eq!(out, b"b\n");

    let mut out = vec![];
    run_program(DEMO_PROGRAM, Box::new(std::io::empty()), &mut out, true).unwrap();
    let expected = format!("{DEMO_PROGRAM}\n\nHello World!\n\n");
    assert_eq!(String::from_utf8(out).unwrap(), expected);
}

#[test]
fn test_run_program_reports_unmatched() {
    let mut out = vec![];
    let err = run_program("+]", Box::new(std::io::empty()), &mut out, false).unwrap_err();
    assert!(err.is_unmatched_loop_end());
}
