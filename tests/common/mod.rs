#![allow(dead_code)]

use std::cell::RefCell;
use std::io::{self, Write};
use std::rc::Rc;

use aq::error::RunError;
use aq::interpreter::Interpreter;
use aq::runner::Aq;

/// `Write` sink whose contents stay readable after the interpreter takes
/// ownership of a clone.
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

/// A session printing into a buffer the test can inspect.
pub fn session() -> (Aq, SharedBuffer) {
    let out = SharedBuffer::default();
    let interpreter = Interpreter::with_output(Box::new(out.clone()));

    (Aq::with_interpreter(interpreter), out)
}

/// Run `source` in a fresh session, returning printed output and outcome.
pub fn run(source: &str) -> (String, Result<(), RunError>) {
    let (mut aq, out) = session();
    let result = aq.run(source);

    (out.contents(), result)
}

/// Run `source`, asserting success, and return printed lines.
pub fn run_ok(source: &str) -> Vec<String> {
    let (output, result) = run(source);

    if let Err(e) = &result {
        let rendered: Vec<String> = e.diagnostics().iter().map(|d| d.to_string()).collect();
        panic!("program failed: {:?}\noutput so far: {}", rendered, output);
    }

    output.lines().map(str::to_string).collect()
}

/// Diagnostics of a unit expected to fail before execution.
pub fn compile_errors(source: &str) -> Vec<String> {
    match aq::runner::Aq::compile(source) {
        Ok(_) => panic!("expected compile errors for: {}", source),
        Err(errors) => errors.iter().map(|e| e.to_string()).collect(),
    }
}
