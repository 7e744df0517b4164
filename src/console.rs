//! Line input for raw character consoles.
//!
//! Serial terminals hand over one keystroke at a time with no local editing,
//! so the editor handles erase itself and optionally redraws the line.

use std::{
    cell::RefCell,
    io::{self, Read, Write},
    rc::Rc,
};

const CR: u8 = b'\r';
const LF: u8 = b'\n';
const BS: u8 = 0x08;
const DEL: u8 = 0x7f;

struct Keys<R> {
    inner: R,
    after_cr: bool,
}

/// Keystroke source shared by the line editor and the VM's `,`.
///
/// An LF right after a CR is dropped, so a CRLF line end reaches whichever
/// reader comes next as a single CR.
pub struct ConsoleInput<R> {
    keys: Rc<RefCell<Keys<R>>>,
}

impl<R> Clone for ConsoleInput<R> {
    fn clone(&self) -> Self {
        Self {
            keys: Rc::clone(&self.keys),
        }
    }
}

impl<R: Read> ConsoleInput<R> {
    pub fn new(inner: R) -> Self {
        Self {
            keys: Rc::new(RefCell::new(Keys {
                inner,
                after_cr: false,
            })),
        }
    }
}

impl<R: Read> Read for ConsoleInput<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let Some(slot) = buf.first_mut() else {
            return Ok(0);
        };

        let mut keys = self.keys.borrow_mut();
        let mut ch = [0_u8];
        loop {
            if keys.inner.read(&mut ch)? == 0 {
                return Ok(0);
            }

            let after_cr = std::mem::replace(&mut keys.after_cr, ch[0] == CR);
            if !(after_cr && ch[0] == LF) {
                *slot = ch[0];
                return Ok(1);
            }
        }
    }
}

pub struct LineEditor {
    prompt: String,
    echo: bool,
}

impl LineEditor {
    pub fn new(prompt: impl Into<String>, echo: bool) -> Self {
        Self {
            prompt: prompt.into(),
            echo,
        }
    }

    /// Reads one line from `input`, without its terminator.
    ///
    /// Returns `None` once `input` is exhausted and nothing was typed.
    pub fn read_line<R, W>(
        &self,
        input: &mut ConsoleInput<R>,
        output: &mut W,
    ) -> io::Result<Option<String>>
    where
        R: Read,
        W: Write + ?Sized,
    {
        write!(output, "{} ", self.prompt)?;
        output.flush()?;

        let mut line = Vec::new();
        let mut buf = [0_u8];
        loop {
            if input.read(&mut buf)? == 0 {
                if line.is_empty() {
                    return Ok(None);
                }
                return Ok(Some(String::from_utf8_lossy(&line).into_owned()));
            }

            match buf[0] {
                CR | LF => return Ok(Some(String::from_utf8_lossy(&line).into_owned())),
                BS | DEL => {
                    if line.pop().is_some() && self.echo {
                        // Blank the erased column before redrawing.
                        line.push(b' ');
                        self.redraw(output, &line)?;
                        line.pop();
                        self.redraw(output, &line)?;
                    }
                }
                ch => {
                    line.push(ch);
                    if self.echo {
                        self.redraw(output, &line)?;
                    }
                }
            }
        }
    }

    fn redraw<W: Write + ?Sized>(&self, output: &mut W, line: &[u8]) -> io::Result<()> {
        write!(output, "\r{} ", self.prompt)?;
        output.write_all(line)?;
        output.flush()
    }
}

#[test]
fn test_read_lines() {
    let editor = LineEditor::new(">>>", false);
    let mut input = ConsoleInput::new(&b"+++\r\n>.\n\rlast"[..]);
    let mut out = vec![];

    assert_eq!(editor.read_line(&mut input, &mut out).unwrap().as_deref(), Some("+++"));
    assert_eq!(editor.read_line(&mut input, &mut out).unwrap().as_deref(), Some(">."));
    assert_eq!(editor.read_line(&mut input, &mut out).unwrap().as_deref(), Some(""));
    assert_eq!(editor.read_line(&mut input, &mut out).unwrap().as_deref(), Some("last"));
    assert_eq!(editor.read_line(&mut input, &mut out).unwrap(), None);
    assert_eq!(out, b">>> >>> >>> >>> >>> ");
}

#[test]
fn test_erase() {
    let editor = LineEditor::new(">>>", false);
    let mut input = ConsoleInput::new(&b"ab\x7fc\x08\x08\x7fxy\r"[..]);
    let mut out = vec![];

    assert_eq!(editor.read_line(&mut input, &mut out).unwrap().as_deref(), Some("xy"));
}

#[test]
fn test_echo_redraw() {
    let editor = LineEditor::new(">", true);
    let mut input = ConsoleInput::new(&b"ab\x7f\r"[..]);
    let mut out = vec![];

    assert_eq!(editor.read_line(&mut input, &mut out).unwrap().as_deref(), Some("a"));
    assert_eq!(out, b"> \r> a\r> ab\r> a \r> a");
}

#[test]
fn test_getbyte_after_crlf_line() {
    use crate::bfvm::BfVM;

    let editor = LineEditor::new(">>>", false);
    let mut input = ConsoleInput::new(&b",.\r\nA\r\n"[..]);
    let mut console = vec![];
    let line = editor.read_line(&mut input, &mut console).unwrap();
    assert_eq!(line.as_deref(), Some(",."));

    let mut out = vec![];
    {
        let mut vm = BfVM::new(Box::new(input.clone()), Box::new(&mut out));
        vm.feed_str(line.as_deref().unwrap_or_default()).unwrap();
    }
    assert_eq!(out, b"A");

    // The CR after the keystroke is still there for the editor.
    assert_eq!(editor.read_line(&mut input, &mut console).unwrap().as_deref(), Some(""));
    assert_eq!(editor.read_line(&mut input, &mut console).unwrap(), None);
}

#[test]
fn test_console_input_folds_crlf() {
    let mut input = ConsoleInput::new(&b"a\r\n\n\r\rb\n"[..]);
    let mut got = vec![];
    input.read_to_end(&mut got).unwrap();
    assert_eq!(got, b"a\r\n\r\rb\n");
}
