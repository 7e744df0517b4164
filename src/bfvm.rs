use std::io::{Read, Write};

use crate::{
    bfir::BfIR,
    errors::{RuntimeError, VMError},
    instrlog::InstrLog,
    tape::Tape,
};

/// Brainfuck machine fed one character at a time.
///
/// Nothing is parsed ahead. Every accepted instruction is appended to the
/// [`InstrLog`] and executed right away; a `[` only records where its loop
/// begins, and the matching `]` repeats the body by replaying the logged
/// range between the two. A `[` whose condition is false opens a skipped
/// region instead, tracked by a nesting counter until its `]` arrives.
pub struct BfVM<'io> {
    tape: Tape,
    log: InstrLog,
    cursor: Option<usize>,
    loops: Vec<usize>,
    skip_depth: usize,
    input: Box<dyn Read + 'io>,
    output: Box<dyn Write + 'io>,
}

impl<'io> BfVM<'io> {
    pub fn new(input: Box<dyn Read + 'io>, output: Box<dyn Write + 'io>) -> Self {
        Self {
            tape: Tape::new(),
            log: InstrLog::new(),
            cursor: None,
            loops: vec![],
            skip_depth: 0,
            input,
            output,
        }
    }

    pub fn tape(&self) -> &Tape {
        &self.tape
    }

    pub fn instructions(&self) -> &InstrLog {
        &self.log
    }

    /// Index of the instruction last dispatched, `None` before the first.
    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    /// Log indices of the open loops, innermost last.
    pub fn open_loops(&self) -> &[usize] {
        &self.loops
    }

    pub fn skip_depth(&self) -> usize {
        self.skip_depth
    }

    pub fn is_skipping(&self) -> bool {
        self.skip_depth > 0
    }

    /// Accepts one source character. Anything outside the alphabet is
    /// dropped without touching any state.
    pub fn feed(&mut self, ch: u8) -> Result<(), VMError> {
        let ir = BfIR::decode(ch);
        if ir.is_nop() {
            return Ok(());
        }

        let index = self.log.push(ir);
        self.cursor = Some(index);
        self.execute(ir, index)?;
        Ok(())
    }

    /// Feeds `src` in order, stopping at the first error.
    pub fn feed_bytes(&mut self, src: &[u8]) -> Result<(), VMError> {
        src.iter().try_for_each(|&ch| self.feed(ch))
    }

    pub fn feed_str(&mut self, src: &str) -> Result<(), VMError> {
        self.feed_bytes(src.as_bytes())
    }

    pub fn flush(&mut self) -> Result<(), VMError> {
        self.output.flush()?;
        Ok(())
    }

    /// Drops the whole session: tape, log, cursor, open loops and skip depth.
    /// The I/O endpoints are kept.
    pub fn reset(&mut self) {
        log::debug!(
            "reset after {} instructions, {} cells touched",
            self.log.len(),
            self.tape.touched()
        );
        self.tape.reset();
        self.log.clear();
        self.cursor = None;
        self.loops.clear();
        self.skip_depth = 0;
    }

    fn execute(&mut self, ir: BfIR, index: usize) -> Result<(), RuntimeError> {
        use BfIR::*;
        let skipping = self.is_skipping();

        match ir {
            AddVal if !skipping => self.tape.add_val(1),
            SubVal if !skipping => self.tape.sub_val(1),
            AddPtr if !skipping => self.tape.add_ptr(1),
            SubPtr if !skipping => self.tape.sub_ptr(1),
            GetByte if !skipping => self.getbyte()?,
            PutByte if !skipping => self.putbyte()?,
            AddVal | SubVal | AddPtr | SubPtr | GetByte | PutByte => {}
            LoopStart => self.loop_start(index),
            LoopEnd => self.loop_end(index)?,
            Nop => {}
        }

        Ok(())
    }

    fn getbyte(&mut self) -> Result<(), RuntimeError> {
        let mut buf = [0_u8];

        // End of input leaves the cell as it is.
        match self.input.read(&mut buf)? {
            0 => {}
            _ => self.tape.set(buf[0]),
        }

        Ok(())
    }

    fn putbyte(&mut self) -> Result<(), RuntimeError> {
        self.output.write_all(&[self.tape.get()])?;
        Ok(())
    }

    fn loop_start(&mut self, index: usize) {
        if !self.is_skipping() && self.tape.get() != 0 {
            self.loops.push(index);
        } else {
            self.skip_depth += 1;
            log::trace!("[ at {index}: skip depth {}", self.skip_depth);
        }
    }

    fn loop_end(&mut self, index: usize) -> Result<(), RuntimeError> {
        if self.is_skipping() {
            self.skip_depth -= 1;
            return Ok(());
        }

        let Some(&start) = self.loops.last() else {
            log::warn!("] at {index} has no open loop");
            return Err(RuntimeError::UnmatchedLoopEnd { index });
        };

        let mut pass = 0_usize;
        while self.tape.get() != 0 {
            pass += 1;
            log::trace!("loop [{start}, {index}] pass {pass}");
            self.replay(start + 1, index)?;
        }

        self.loops.pop();
        Ok(())
    }

    /// Re-executes logged instructions `from..to` without appending them.
    fn replay(&mut self, from: usize, to: usize) -> Result<(), RuntimeError> {
        let saved = self.cursor;

        let mut ret = Ok(());
        for pc in from..to {
            let Some(ir) = self.log.get(pc) else {
                break;
            };
            self.cursor = Some(pc);
            ret = self.execute(ir, pc);
            if ret.is_err() {
                break;
            }
        }

        self.cursor = saved;
        ret
    }
}

#[cfg(test)]
fn run_with(src: &str, input: &[u8]) -> (Result<(), VMError>, Vec<u8>) {
    let mut out = vec![];
    let ret = {
        let mut vm = BfVM::new(Box::new(input), Box::new(&mut out));
        vm.feed_str(src)
    };
    (ret, out)
}

#[test]
fn test_scenarios() {
    let mut vm = BfVM::new(Box::new(std::io::empty()), Box::new(std::io::sink()));
    vm.feed_str("++>+++").unwrap();
    assert_eq!(vm.tape().value_at(0), 2);
    assert_eq!(vm.tape().value_at(1), 3);
    assert_eq!(vm.tape().ptr(), 1);
    assert_eq!(vm.cursor(), Some(5));

    let mut vm = BfVM::new(Box::new(std::io::empty()), Box::new(std::io::sink()));
    vm.feed_str("+++").unwrap();
    vm.feed_str("[>+<-]").unwrap();
    assert_eq!(vm.tape().value_at(0), 0);
    assert_eq!(vm.tape().value_at(1), 3);
    assert_eq!(vm.tape().ptr(), 0);
    assert!(vm.open_loops().is_empty());
    assert_eq!(vm.cursor(), Some(8));

    let (ret, out) = run_with("+++.", b"");
    ret.unwrap();
    assert_eq!(out, vec![3]);

    let (ret, out) = run_with(",.", b"A");
    ret.unwrap();
    assert_eq!(out, b"A");
}

#[test]
fn test_ignores_other_characters() {
    let mut vm = BfVM::new(Box::new(std::io::empty()), Box::new(std::io::sink()));
    vm.feed_str("hello + world\n+ # >").unwrap();
    assert_eq!(vm.instructions().to_string(), "++>");
    assert_eq!(vm.tape().value_at(0), 2);
    assert_eq!(vm.tape().ptr(), 1);
}

#[test]
fn test_skipped_loop_has_no_effect() {
    let (ret, out) = run_with("[.+>,<-]+.", b"x");
    ret.unwrap();
    assert_eq!(out, vec![1]);
}

#[test]
fn test_nested_skip_resumes_after_outer_end() {
    let mut out = vec![];
    {
        let mut vm = BfVM::new(Box::new(std::io::empty()), Box::new(&mut out));
        vm.feed_str("[+[.+]+.]").unwrap();
        assert_eq!(vm.skip_depth(), 0);
        assert_eq!(vm.tape().touched(), 0);

        vm.feed_str("+.").unwrap();
        assert_eq!(vm.tape().get(), 1);
    }
    assert_eq!(out, vec![1]);
}

#[test]
fn test_skip_depth_across_feeds() {
    let mut vm = BfVM::new(Box::new(std::io::empty()), Box::new(std::io::sink()));
    vm.feed_str("[[").unwrap();
    assert_eq!(vm.skip_depth(), 2);
    vm.feed_str("+]").unwrap();
    assert_eq!(vm.skip_depth(), 1);
    vm.feed_str("]+").unwrap();
    assert_eq!(vm.skip_depth(), 0);
    assert_eq!(vm.tape().get(), 1);
}

#[test]
fn test_loop_split_over_lines() {
    let mut vm = BfVM::new(Box::new(std::io::empty()), Box::new(std::io::sink()));
    vm.feed_str("+++++[>").unwrap();
    assert_eq!(vm.open_loops(), &[5]);
    assert_eq!(vm.tape().ptr(), 1);

    vm.feed_str("++<-").unwrap();
    vm.feed_str("]").unwrap();
    assert_eq!(vm.tape().value_at(1), 10);
    assert!(vm.open_loops().is_empty());
}

#[test]
fn test_nested_loops() {
    // 4 * 3 * 2 into cell 2
    let mut vm = BfVM::new(Box::new(std::io::empty()), Box::new(std::io::sink()));
    vm.feed_str("++++[>+++[>++<-]<-]").unwrap();
    assert_eq!(vm.tape().value_at(0), 0);
    assert_eq!(vm.tape().value_at(1), 0);
    assert_eq!(vm.tape().value_at(2), 24);
    assert_eq!(vm.instructions().len(), 19);
}

#[test]
fn test_hello_world() {
    let (ret, out) = run_with(crate::driver::DEMO_PROGRAM, b"");
    ret.unwrap();
    assert_eq!(out, b"Hello World!\n");
}

#[test]
fn test_echo_until_zero() {
    let (ret, out) = run_with(",[.,]", b"abc\0tail");
    ret.unwrap();
    assert_eq!(out, b"abc");
}

#[test]
fn test_getbyte_at_end_of_input() {
    let mut vm = BfVM::new(Box::new(&b""[..]), Box::new(std::io::sink()));
    vm.feed_str("+++++,").unwrap();
    assert_eq!(vm.tape().get(), 5);
}

#[test]
fn test_unmatched_loop_end() {
    let mut vm = BfVM::new(Box::new(std::io::empty()), Box::new(std::io::sink()));
    vm.feed_str("+").unwrap();

    let err = vm.feed(b']').unwrap_err();
    assert!(err.is_unmatched_loop_end());
    match err {
        VMError::Runtime(RuntimeError::UnmatchedLoopEnd { index }) => assert_eq!(index, 1),
        _ => panic!(),
    }

    // Reported on a zero cell as well.
    vm.feed_str(">").unwrap();
    assert!(vm.feed(b']').unwrap_err().is_unmatched_loop_end());

    vm.feed_str("<+").unwrap();
    assert_eq!(vm.tape().get(), 2);
    assert_eq!(vm.skip_depth(), 0);
    assert_eq!(vm.instructions().to_string(), "+]>]<+");
}

#[test]
fn test_unmatched_loop_end_drops_rest_of_feed() {
    let mut vm = BfVM::new(Box::new(std::io::empty()), Box::new(std::io::sink()));
    assert!(vm.feed_str("+]+++").unwrap_err().is_unmatched_loop_end());
    assert_eq!(vm.instructions().to_string(), "+]");
    assert_eq!(vm.tape().get(), 1);
    assert_eq!(vm.cursor(), Some(1));

    vm.feed_str("+++").unwrap();
    assert_eq!(vm.tape().get(), 4);
}

#[cfg(test)]
struct FailingWriter {
    writes_left: usize,
}

#[cfg(test)]
impl Write for FailingWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        if self.writes_left == 0 {
            return Err(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "closed"));
        }
        self.writes_left -= 1;
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

#[test]
fn test_output_error_inside_replay() {
    let mut vm = BfVM::new(
        Box::new(std::io::empty()),
        Box::new(FailingWriter { writes_left: 2 }),
    );

    // The third `.` runs on the second replay pass.
    let err = vm.feed_str("+++[.-]").unwrap_err();
    match err {
        VMError::Runtime(RuntimeError::IO(e)) => {
            assert_eq!(e.kind(), std::io::ErrorKind::BrokenPipe)
        }
        _ => panic!(),
    }
    assert_eq!(vm.cursor(), Some(6));
    assert_eq!(vm.open_loops(), &[3]);
    assert_eq!(vm.tape().get(), 1);
    assert_eq!(vm.skip_depth(), 0);
}

#[test]
fn test_inner_loop_skipped_then_entered() {
    // The inner `[` is skipped on the live pass and entered on the replay.
    let mut vm = BfVM::new(Box::new(std::io::empty()), Box::new(std::io::sink()));
    vm.feed_str("++[>[>+<-]+<-]").unwrap();
    assert_eq!(vm.tape().value_at(0), 0);
    assert_eq!(vm.tape().value_at(1), 1);
    assert_eq!(vm.tape().value_at(2), 1);
    assert_eq!(vm.tape().ptr(), 0);
    assert!(vm.open_loops().is_empty());
    assert_eq!(vm.skip_depth(), 0);
    assert_eq!(vm.cursor(), Some(13));

    let mut vm = BfVM::new(Box::new(std::io::empty()), Box::new(std::io::sink()));
    vm.feed_str("++[>[-]<[->+<]>[<+>-]<-]").unwrap();
    assert_eq!(vm.tape().value_at(0), 0);
    assert_eq!(vm.tape().value_at(1), 0);
    assert_eq!(vm.tape().ptr(), 0);
    assert!(vm.open_loops().is_empty());
}

#[test]
fn test_unclosed_loop_stays_open() {
    let mut vm = BfVM::new(Box::new(std::io::empty()), Box::new(std::io::sink()));
    vm.feed_str("+[+").unwrap();
    assert_eq!(vm.open_loops(), &[1]);
    assert_eq!(vm.tape().get(), 2);
}

#[test]
fn test_reset() {
    let mut vm = BfVM::new(Box::new(std::io::empty()), Box::new(std::io::sink()));
    vm.feed_str("+[>+<[").unwrap();
    assert_eq!(vm.open_loops(), &[1, 5]);

    vm.reset();
    assert_eq!(vm.tape().ptr(), 0);
    assert_eq!(vm.tape().touched(), 0);
    assert_eq!(vm.cursor(), None);
    assert!(vm.instructions().is_empty());
    assert!(vm.open_loops().is_empty());
    assert_eq!(vm.skip_depth(), 0);

    vm.feed_str("++").unwrap();
    assert_eq!(vm.tape().get(), 2);
    assert_eq!(vm.cursor(), Some(1));
}
