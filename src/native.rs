//! Native (host) functions.
//!
//! A host binds a [`NativeFunction`] into the global scope with
//! [`Interpreter::define_native`](crate::interpreter::Interpreter::define_native)
//! before interpretation begins.

use chrono::Utc;
use log::debug;

use crate::interpreter::Interpreter;
use crate::value::Value;

/// Capability contract for host functions callable from scripts.
pub trait NativeFunction {
    /// Global name the function is bound under.
    fn name(&self) -> &str;

    /// Exact number of arguments the function accepts.
    fn arity(&self) -> usize;

    /// Invoke the function.  Arity has already been checked by the caller;
    /// an `Err` message becomes a runtime error at the call site.
    fn call(
        &self,
        interpreter: &mut Interpreter,
        arguments: &[Value],
    ) -> std::result::Result<Value, String>;
}

/// `clock()` ‑ whole seconds since the Unix epoch.
#[derive(Debug, Default)]
pub struct Clock;

impl NativeFunction for Clock {
    fn name(&self) -> &str {
        "clock"
    }

    fn arity(&self) -> usize {
        0
    }

    fn call(&self, _interpreter: &mut Interpreter, _arguments: &[Value]) -> Result<Value, String> {
        let seconds: i64 = Utc::now().timestamp();

        debug!("Native function 'clock' returned: {}", seconds);

        Ok(Value::Number(seconds as f64))
    }
}
