#![allow(dead_code)]

use std::cell::RefCell;
use std::io::{self, Write};
use std::rc::Rc;

use rox::error::LoxError;
use rox::session::Session;

/// `Write` sink that tests can read back after the interpreter is done.
#[derive(Clone, Default)]
pub struct SharedBuffer(Rc<RefCell<Vec<u8>>>);

impl SharedBuffer {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.borrow()).into_owned()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// A session whose `print` output is captured.
pub fn session() -> (Session, SharedBuffer) {
    let buffer = SharedBuffer::default();
    let session = Session::with_output(Box::new(buffer.clone()));
    (session, buffer)
}

/// Runs `source` and returns everything it printed, or the error that
/// stopped it.
pub fn run(source: &str) -> Result<String, LoxError> {
    let (mut session, buffer) = session();
    session.run(source)?;
    Ok(buffer.contents())
}

/// Runs `source`, which must fail, returning the error together with the
/// output printed before the failure.
pub fn run_err(source: &str) -> (LoxError, String) {
    let (mut session, buffer) = session();
    match session.run(source) {
        Ok(()) => panic!("expected an error, program printed:\n{}", buffer.contents()),
        Err(e) => (e, buffer.contents()),
    }
}

/// Printed lines of a program that must succeed.
pub fn lines(source: &str) -> Vec<String> {
    match run(source) {
        Ok(out) => out.lines().map(str::to_string).collect(),
        Err(e) => panic!("program failed:\n{}", e),
    }
}
