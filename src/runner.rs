//! Session driver: scan → parse → resolve → interpret.
//!
//! One [`Aq`] session owns one interpreter, so globals defined by one unit of
//! source stay visible to the next.  That is what the interactive loop relies
//! on: every line is its own unit, with its own diagnostics, against shared
//! global state.

use std::io::{self, BufRead, Write};

use log::{debug, info};

use crate::ast::Stmt;
use crate::error::{AqError, RunError};
use crate::interpreter::Interpreter;
use crate::parser::Parser;
use crate::resolver::{ResolutionTable, Resolver};
use crate::scanner::scan;

/// A persistent interpreter session.
pub struct Aq {
    interpreter: Interpreter,
}

impl Default for Aq {
    fn default() -> Self {
        Self::new()
    }
}

impl Aq {
    /// Session printing to stdout.
    pub fn new() -> Self {
        Self::with_interpreter(Interpreter::new())
    }

    pub fn with_interpreter(interpreter: Interpreter) -> Self {
        Self { interpreter }
    }

    /// Access the interpreter, e.g. to inject native functions.
    pub fn interpreter_mut(&mut self) -> &mut Interpreter {
        &mut self.interpreter
    }

    /// Scan, parse and resolve one unit without running it.
    ///
    /// Lexical and syntax errors are reported together; resolution only runs
    /// on a unit that parsed cleanly.
    pub fn compile(source: &str) -> Result<(Vec<Stmt>, ResolutionTable), Vec<AqError>> {
        let (tokens, mut errors) = scan(source);

        let statements: Vec<Stmt> = match Parser::new(&tokens).parse() {
            Ok(statements) if errors.is_empty() => statements,
            Ok(_) => return Err(errors),
            Err(parse_errors) => {
                errors.extend(parse_errors);
                return Err(errors);
            }
        };

        let table: ResolutionTable = Resolver::new().resolve(&statements)?;

        Ok((statements, table))
    }

    /// Run one unit of source against this session.
    pub fn run(&mut self, source: &str) -> Result<(), RunError> {
        info!("Running unit of {} bytes", source.len());

        let (statements, table) = Self::compile(source).map_err(RunError::Compile)?;

        // The merged table only grows, bounded by the total source entered
        // in this session: ids are never reused across units.
        self.interpreter.resolve(table);
        self.interpreter
            .interpret(&statements)
            .map_err(RunError::Runtime)
    }
}

/// Interactive loop: prompt with `> `, run each line as its own unit, report
/// failures to `diagnostics` and keep going until `input` is exhausted.
pub fn repl<R, P, D>(session: &mut Aq, input: R, mut prompt: P, mut diagnostics: D) -> io::Result<()>
where
    R: BufRead,
    P: Write,
    D: Write,
{
    info!("Starting interactive session");

    let mut lines = input.lines();

    loop {
        write!(prompt, "> ")?;
        prompt.flush()?;

        let Some(line) = lines.next() else {
            writeln!(prompt)?;
            break;
        };
        let line: String = line?;

        debug!("REPL line: {}", line);

        if let Err(failure) = session.run(&line) {
            for error in failure.diagnostics() {
                writeln!(diagnostics, "{}", error)?;
            }
        }
    }

    info!("Interactive session finished");
    Ok(())
}
