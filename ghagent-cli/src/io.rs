//! Terminal stream bundle.
//!
//! Commands write through this instead of `println!` so tests can run
//! them against captured buffers, and so TTY-dependent behavior (table
//! layout, colors, prompts) is decided in one place.

use std::io::{self, IsTerminal, Write};
use std::sync::{Arc, Mutex};

pub struct Io {
    pub out: Box<dyn Write + Send>,
    pub err: Box<dyn Write + Send>,
    pub stdout_tty: bool,
    pub stderr_tty: bool,
    pub stdin_tty: bool,
}

impl Io {
    pub fn system() -> Self {
        Self {
            out: Box::new(io::stdout()),
            err: Box::new(io::stderr()),
            stdout_tty: io::stdout().is_terminal(),
            stderr_tty: io::stderr().is_terminal(),
            stdin_tty: io::stdin().is_terminal(),
        }
    }

    /// Interactive prompting needs a terminal on both ends.
    pub fn can_prompt(&self) -> bool {
        self.stdin_tty && self.stdout_tty
    }

    /// Short status line on stderr, shown only when stderr is a
    /// terminal so piped output stays clean.
    pub fn status(&mut self, message: &str) {
        if self.stderr_tty {
            let _ = writeln!(self.err, "{message}");
        }
    }

    /// Capture-backed streams for tests. Returns the bundle plus
    /// handles onto the stdout and stderr buffers.
    pub fn test() -> (Self, SharedBuffer, SharedBuffer) {
        let out = SharedBuffer::default();
        let err = SharedBuffer::default();
        let io = Self {
            out: Box::new(out.clone()),
            err: Box::new(err.clone()),
            stdout_tty: false,
            stderr_tty: false,
            stdin_tty: false,
        };
        (io, out, err)
    }
}

#[derive(Clone, Default)]
pub struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
