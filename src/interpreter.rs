//! Tree‑walking evaluator.
//!
//! `execute` and `evaluate` are mutually recursive walks over the AST.  Local
//! variables are reached through the resolver's distances; anything the
//! resolver left out of the table is a global.
//!
//! `break` and `return` travel as a [`Flow`] result rather than through the
//! error channel: each statement reports how it completed and the enclosing
//! loop or call boundary consumes the signal meant for it.
//!
//! User function calls nest at most [`MAX_CALL_DEPTH`] deep; one more is a
//! "Stack overflow." runtime error rather than a crash.

use std::collections::HashMap;
use std::io::{self, Write};
use std::mem;
use std::rc::Rc;

use log::{debug, info};

use crate::ast::{Expr, ExprId, FunctionDecl, LiteralValue, Stmt};
use crate::environment::{self, EnvRef, Environment};
use crate::error::{AqError, Result};
use crate::native::{Clock, NativeFunction};
use crate::resolver::ResolutionTable;
use crate::stack;
use crate::token::{Token, TokenType};
use crate::value::{AqFunction, Callable, Value};

/// Deepest nesting of active user function calls.
pub const MAX_CALL_DEPTH: usize = 1024;

/// How a statement finished.
#[derive(Debug, Clone, PartialEq)]
pub enum Flow {
    /// Ran to completion; continue with the next statement.
    Normal,

    /// `break` requested; unwinds to the nearest loop.
    Break,

    /// `return` requested; unwinds to the nearest call.
    Return(Value),
}

pub struct Interpreter {
    globals: EnvRef,
    environment: EnvRef,
    locals: HashMap<ExprId, usize>,
    out: Box<dyn Write>,
    depth: usize, // active user function calls
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpreter {
    /// Creates an interpreter printing to stdout, with `clock` predefined.
    pub fn new() -> Self {
        Self::with_output(Box::new(io::stdout()))
    }

    /// Creates an interpreter whose `print` statements write to `out`.
    pub fn with_output(out: Box<dyn Write>) -> Self {
        info!("Initializing Interpreter");

        let globals: EnvRef = Environment::new().into_ref();

        let mut interpreter = Self {
            environment: Rc::clone(&globals),
            globals,
            locals: HashMap::new(),
            out,
            depth: 0,
        };

        interpreter.define_native(Rc::new(Clock));

        interpreter
    }

    /// Bind a host function in the global scope.
    pub fn define_native(&mut self, native: Rc<dyn NativeFunction>) {
        debug!("Defining native function '{}'", native.name());

        let name: String = native.name().to_string();
        self.globals
            .borrow_mut()
            .define(&name, Value::Callable(Callable::Native(native)));
    }

    /// Merge a unit's resolution table.  Entries from earlier units stay, as
    /// closures created by them may still run, so the table grows with the
    /// total source a session has run.
    pub fn resolve(&mut self, table: ResolutionTable) {
        debug!("Recording {} resolved local(s)", table.len());

        self.locals.extend(table);
    }

    /// Interprets a list of statements (a "program").
    ///
    /// The first runtime error aborts the remaining statements.  The current
    /// environment is back at globals afterwards in every case.
    pub fn interpret(&mut self, statements: &[Stmt]) -> Result<()> {
        debug!("Interpreting {} statements", statements.len());

        for stmt in statements {
            match self.execute(stmt) {
                Ok(_) => {}
                Err(e) => {
                    info!("Interpretation aborted: {}", e);
                    self.environment = Rc::clone(&self.globals);
                    self.depth = 0;
                    return Err(e);
                }
            }
        }

        self.out.flush()?;

        info!("Interpretation completed successfully");
        Ok(())
    }

    /// Executes a single statement.
    pub fn execute(&mut self, stmt: &Stmt) -> Result<Flow> {
        stack::guarded(|| self.execute_stmt(stmt))
    }

    fn execute_stmt(&mut self, stmt: &Stmt) -> Result<Flow> {
        match stmt {
            Stmt::Expression(expr) => {
                self.evaluate(expr)?;
                Ok(Flow::Normal)
            }

            Stmt::Print(expr) => {
                let value: Value = self.evaluate(expr)?;
                writeln!(self.out, "{}", value)?;
                debug!("Printed value: {}", value);
                Ok(Flow::Normal)
            }

            Stmt::Var { name, initializer } => {
                let value: Value = match initializer {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };
                debug!("Defining variable '{}' = {}", name.lexeme, value);
                self.environment.borrow_mut().define(&name.lexeme, value);
                Ok(Flow::Normal)
            }

            Stmt::Block(statements) => {
                let scope: EnvRef =
                    Environment::with_enclosing(Rc::clone(&self.environment)).into_ref();
                self.execute_block(statements, scope)
            }

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                if self.evaluate(condition)?.is_truthy() {
                    self.execute(then_branch)
                } else if let Some(else_stmt) = else_branch {
                    self.execute(else_stmt)
                } else {
                    Ok(Flow::Normal)
                }
            }

            Stmt::While { condition, body } => {
                debug!("Entering while loop");
                while self.evaluate(condition)?.is_truthy() {
                    match self.execute(body)? {
                        Flow::Normal => {}
                        Flow::Break => break,
                        flow @ Flow::Return(_) => return Ok(flow),
                    }
                }
                debug!("Exited while loop");
                Ok(Flow::Normal)
            }

            Stmt::Break(_) => Ok(Flow::Break),

            Stmt::Return { value, .. } => {
                let value: Value = match value {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };
                Ok(Flow::Return(value))
            }

            Stmt::Function { name, function } => {
                let value: Value = self.make_function(&name.lexeme, function);
                self.environment.borrow_mut().define(&name.lexeme, value);
                debug!(
                    "Function '{}' defined with {} parameters",
                    name.lexeme,
                    function.params.len()
                );
                Ok(Flow::Normal)
            }
        }
    }

    /// Run `statements` inside `scope`, restoring the previous environment on
    /// every exit path (normal, `break`, `return`, or error).
    pub fn execute_block(&mut self, statements: &[Stmt], scope: EnvRef) -> Result<Flow> {
        let previous: EnvRef = mem::replace(&mut self.environment, scope);

        let result = self.execute_all(statements);

        self.environment = previous;
        result
    }

    fn execute_all(&mut self, statements: &[Stmt]) -> Result<Flow> {
        for stmt in statements {
            match self.execute(stmt)? {
                Flow::Normal => {}
                flow => return Ok(flow),
            }
        }

        Ok(Flow::Normal)
    }

    /// Evaluates an expression and returns a Value.
    pub fn evaluate(&mut self, expr: &Expr) -> Result<Value> {
        stack::guarded(|| self.evaluate_expr(expr))
    }

    fn evaluate_expr(&mut self, expr: &Expr) -> Result<Value> {
        match expr {
            Expr::Literal(literal) => Ok(match literal {
                LiteralValue::Number(n) => Value::Number(*n),
                LiteralValue::Str(s) => Value::String(s.clone()),
                LiteralValue::True => Value::Bool(true),
                LiteralValue::False => Value::Bool(false),
                LiteralValue::Nil => Value::Nil,
            }),

            Expr::Grouping(inner) => self.evaluate(inner),

            Expr::Unary { operator, right } => self.evaluate_unary(operator, right),

            Expr::Binary {
                left,
                operator,
                right,
            } => self.evaluate_binary(left, operator, right),

            Expr::Logical {
                left,
                operator,
                right,
            } => {
                let left_val: Value = self.evaluate(left)?;

                // The deciding operand is the result, not a coerced boolean.
                let decided: bool = if operator.token_type == TokenType::OR {
                    left_val.is_truthy()
                } else {
                    !left_val.is_truthy()
                };

                if decided {
                    Ok(left_val)
                } else {
                    self.evaluate(right)
                }
            }

            Expr::Variable { id, name } => self.look_up_variable(*id, name),

            Expr::Assign { id, name, value } => {
                let value: Value = self.evaluate(value)?;

                let assigned: bool = match self.locals.get(id) {
                    Some(&distance) => environment::assign_at(
                        &self.environment,
                        distance,
                        &name.lexeme,
                        value.clone(),
                    ),
                    None => self
                        .globals
                        .borrow_mut()
                        .assign(&name.lexeme, value.clone()),
                };

                if !assigned {
                    return Err(undefined_variable(name));
                }

                debug!("Assigned value {} to '{}'", value, name.lexeme);
                Ok(value)
            }

            Expr::Call {
                callee,
                paren,
                arguments,
            } => {
                let callee_val: Value = self.evaluate(callee)?;

                let mut arg_values: Vec<Value> = Vec::with_capacity(arguments.len());
                for arg in arguments {
                    arg_values.push(self.evaluate(arg)?);
                }

                self.invoke_callable(callee_val, paren, &arg_values)
            }

            Expr::Function(function) => Ok(self.make_function("anonymous", function)),
        }
    }

    /// Close `declaration` over the current environment.
    fn make_function(&self, name: &str, declaration: &Rc<FunctionDecl>) -> Value {
        Value::Callable(Callable::Function(Rc::new(AqFunction {
            name: name.to_string(),
            declaration: Rc::clone(declaration),
            closure: Rc::clone(&self.environment),
        })))
    }

    fn look_up_variable(&self, id: ExprId, name: &Token) -> Result<Value> {
        let value: Option<Value> = match self.locals.get(&id) {
            Some(&distance) => environment::get_at(&self.environment, distance, &name.lexeme),
            None => self.globals.borrow().get(&name.lexeme),
        };

        value.ok_or_else(|| undefined_variable(name))
    }

    /// Evaluates a unary expression.
    fn evaluate_unary(&mut self, operator: &Token, right: &Expr) -> Result<Value> {
        let right_val: Value = self.evaluate(right)?;

        match operator.token_type {
            TokenType::MINUS => match right_val {
                Value::Number(n) => Ok(Value::Number(-n)),
                other => Err(AqError::runtime(
                    operator,
                    format!("Operand must be a number, got {}.", describe(&other)),
                )),
            },
            TokenType::BANG => Ok(Value::Bool(!right_val.is_truthy())),
            _ => Err(AqError::runtime(operator, "Invalid unary operator.")),
        }
    }

    /// Evaluates a binary expression.
    fn evaluate_binary(&mut self, left: &Expr, operator: &Token, right: &Expr) -> Result<Value> {
        let left_val: Value = self.evaluate(left)?;
        let right_val: Value = self.evaluate(right)?;

        debug!(
            "Binary '{}' on {} and {}",
            operator.lexeme, left_val, right_val
        );

        match operator.token_type {
            TokenType::PLUS => match (left_val, right_val) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),
                (Value::String(a), Value::String(b)) => Ok(Value::String(a + &b)),
                (Value::String(_), other) => Err(AqError::runtime(
                    operator,
                    format!("Expected a string, got {}.", describe(&other)),
                )),
                (Value::Number(_), other) => Err(AqError::runtime(
                    operator,
                    format!("Expected a number, got {}.", describe(&other)),
                )),
                (other, _) => Err(AqError::runtime(
                    operator,
                    format!(
                        "Operands must be two numbers or two strings, got {}.",
                        describe(&other)
                    ),
                )),
            },

            TokenType::MINUS => {
                let (a, b) = number_operands(operator, &left_val, &right_val)?;
                Ok(Value::Number(a - b))
            }

            TokenType::STAR => {
                let (a, b) = number_operands(operator, &left_val, &right_val)?;
                Ok(Value::Number(a * b))
            }

            // IEEE‑754: division by zero yields ±inf or NaN.
            TokenType::SLASH => {
                let (a, b) = number_operands(operator, &left_val, &right_val)?;
                Ok(Value::Number(a / b))
            }

            TokenType::LESS => {
                let (a, b) = number_operands(operator, &left_val, &right_val)?;
                Ok(Value::Bool(a < b))
            }

            TokenType::LESS_EQUAL => {
                let (a, b) = number_operands(operator, &left_val, &right_val)?;
                Ok(Value::Bool(a <= b))
            }

            TokenType::GREATER => {
                let (a, b) = number_operands(operator, &left_val, &right_val)?;
                Ok(Value::Bool(a > b))
            }

            TokenType::GREATER_EQUAL => {
                let (a, b) = number_operands(operator, &left_val, &right_val)?;
                Ok(Value::Bool(a >= b))
            }

            TokenType::EQUAL_EQUAL => Ok(Value::Bool(left_val == right_val)),

            TokenType::BANG_EQUAL => Ok(Value::Bool(left_val != right_val)),

            _ => Err(AqError::runtime(operator, "Invalid binary operator.")),
        }
    }

    /// Invokes a callable (native or user-defined function).
    fn invoke_callable(
        &mut self,
        callee_val: Value,
        paren: &Token,
        arg_values: &[Value],
    ) -> Result<Value> {
        let callable: Callable = match callee_val {
            Value::Callable(callable) => callable,
            other => {
                return Err(AqError::runtime(
                    paren,
                    format!("Can only call functions, got {}.", describe(&other)),
                ));
            }
        };

        if arg_values.len() != callable.arity() {
            return Err(AqError::runtime(
                paren,
                format!(
                    "Expected {} arguments but got {}.",
                    callable.arity(),
                    arg_values.len()
                ),
            ));
        }

        debug!(
            "Calling '{}' with {} argument(s)",
            callable.name(),
            arg_values.len()
        );

        match callable {
            Callable::Native(native) => native
                .call(self, arg_values)
                .map_err(|message| AqError::runtime(paren, message)),

            Callable::Function(function) => {
                if self.depth >= MAX_CALL_DEPTH {
                    return Err(AqError::runtime(paren, "Stack overflow."));
                }

                let mut frame = Environment::with_enclosing(Rc::clone(&function.closure));
                for (param, arg_val) in function.declaration.params.iter().zip(arg_values) {
                    frame.define(&param.lexeme, arg_val.clone());
                }

                self.depth += 1;
                let flow = self.execute_block(&function.declaration.body, frame.into_ref());
                self.depth -= 1;

                match flow? {
                    Flow::Return(value) => Ok(value),
                    // `break` cannot cross a function body; falling off the
                    // end yields nil.
                    Flow::Normal | Flow::Break => Ok(Value::Nil),
                }
            }
        }
    }
}

fn undefined_variable(name: &Token) -> AqError {
    AqError::runtime(name, format!("Undefined variable '{}'.", name.lexeme))
}

/// `string "abc"`, `number 3`, `nil` … for error messages.
fn describe(value: &Value) -> String {
    match value {
        Value::Nil => "nil".to_string(),
        Value::String(s) => format!("string \"{}\"", s),
        other => format!("{} {}", other.type_name(), other),
    }
}

fn number_operands(operator: &Token, left: &Value, right: &Value) -> Result<(f64, f64)> {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => Ok((*a, *b)),
        (Value::Number(_), bad) | (bad, _) => Err(AqError::runtime(
            operator,
            format!("Operands must be numbers, got {}.", describe(bad)),
        )),
    }
}
