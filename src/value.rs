//! Runtime values.
//!
//! The value space is a closed sum: every consumer matches on [`Value`]
//! exhaustively instead of probing types at runtime.

use std::fmt;
use std::rc::Rc;

use crate::ast::FunctionDecl;
use crate::environment::EnvRef;
use crate::native::NativeFunction;

#[derive(Debug, Clone)]
pub enum Value {
    Nil,
    Bool(bool),
    Number(f64),
    String(String),
    Callable(Callable),
}

impl Value {
    /// `nil` and `false` are falsy; everything else, `0` and `""` included,
    /// is truthy.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Nil => false,
            Value::Bool(b) => *b,
            _ => true,
        }
    }

    /// Short type label used in runtime error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Nil => "nil",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Callable(_) => "function",
        }
    }
}

impl PartialEq for Value {
    /// No coercion between types: `nil != false`, `0 != ""`.  Numbers follow
    /// IEEE‑754 (`NaN != NaN`); callables compare by identity.
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Nil, Value::Nil) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Callable(a), Value::Callable(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => write!(f, "nil"),

            Value::Bool(b) => write!(f, "{}", b),

            // 4.0 → "4", 4.5 → "4.5"
            Value::Number(n) => {
                // Covers -0.0 too, which prints as `0`.
                if *n == 0.0 {
                    write!(f, "0")
                } else if n.fract() == 0.0 {
                    write!(f, "{:.0}", n)
                } else {
                    write!(f, "{}", n)
                }
            }

            Value::String(s) => write!(f, "{}", s),

            Value::Callable(c) => write!(f, "{}", c),
        }
    }
}

/// Anything that can appear in call position.
#[derive(Clone)]
pub enum Callable {
    /// Host function injected into globals.
    Native(Rc<dyn NativeFunction>),

    /// User function closing over its defining environment.
    Function(Rc<AqFunction>),
}

impl Callable {
    pub fn name(&self) -> &str {
        match self {
            Callable::Native(native) => native.name(),
            Callable::Function(function) => &function.name,
        }
    }

    pub fn arity(&self) -> usize {
        match self {
            Callable::Native(native) => native.arity(),
            Callable::Function(function) => function.declaration.params.len(),
        }
    }
}

impl PartialEq for Callable {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Callable::Native(a), Callable::Native(b)) => Rc::ptr_eq(a, b),
            (Callable::Function(a), Callable::Function(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Display for Callable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Callable::Native(native) => write!(f, "<native fn {}>", native.name()),
            Callable::Function(function) => {
                write!(f, "<fun {}/{}>", function.name, self.arity())
            }
        }
    }
}

impl fmt::Debug for Callable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self)
    }
}

/// A user‑defined function value: declaration plus captured environment.
pub struct AqFunction {
    /// Declared name, or `anonymous` for function literals.
    pub name: String,

    pub declaration: Rc<FunctionDecl>,

    /// Environment active where the function was defined.
    pub closure: EnvRef,
}

impl fmt::Debug for AqFunction {
    // The closure may reach this function again; never print it.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AqFunction")
            .field("name", &self.name)
            .field("arity", &self.declaration.params.len())
            .finish_non_exhaustive()
    }
}
