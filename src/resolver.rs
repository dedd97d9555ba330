//! Static scope resolution.
//!
//! Runs between parsing and execution and computes no values.  It keeps a
//! stack of block and function scopes, each mapping a name to whether its
//! declaration is complete, and from that:
//!
//! - rejects redeclaring a name in one local scope, reading a local inside
//!   its own initializer, and `return` outside a function;
//! - records for every local `Variable`/`Assign` node how many scopes lie
//!   between the use and its binding.
//!
//! Names found in no scope on the stack are globals and get no table entry.

use crate::ast::{Expr, ExprId, FunctionDecl, Stmt};
use crate::error::AqError;
use crate::stack;
use crate::token::Token;
use log::{debug, info};
use std::collections::HashMap;

/// Scope distance of every resolved local `Variable`/`Assign` node.
pub type ResolutionTable = HashMap<ExprId, usize>;

/// Are we inside a user function?  Used to validate `return`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum FunctionType {
    None,
    Function,
}

/// One resolution pass; consumed by [`Resolver::resolve`].
pub struct Resolver<'a> {
    scopes: Vec<HashMap<&'a str, bool>>, // false=declared, true=defined
    current_function: FunctionType,
    locals: ResolutionTable,
    errors: Vec<AqError>,
}

impl<'a> Default for Resolver<'a> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> Resolver<'a> {
    pub fn new() -> Self {
        info!("Resolver instantiated");

        Resolver {
            scopes: Vec::new(),
            current_function: FunctionType::None,
            locals: HashMap::new(),
            errors: Vec::new(),
        }
    }

    /// Walk all top‑level statements, returning the side table or every
    /// static error found.
    pub fn resolve(
        mut self,
        statements: &'a [Stmt],
    ) -> std::result::Result<ResolutionTable, Vec<AqError>> {
        info!(
            "Beginning resolve pass over {} statement(s)",
            statements.len()
        );

        self.resolve_stmts(statements);

        if self.errors.is_empty() {
            info!("Resolved {} local reference(s)", self.locals.len());

            Ok(self.locals)
        } else {
            Err(self.errors)
        }
    }

    fn resolve_stmts(&mut self, statements: &'a [Stmt]) {
        for stmt in statements {
            self.resolve_stmt(stmt);
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Statement resolution
    // ─────────────────────────────────────────────────────────────────────────

    fn resolve_stmt(&mut self, stmt: &'a Stmt) {
        stack::guarded(|| self.resolve_stmt_node(stmt))
    }

    fn resolve_stmt_node(&mut self, stmt: &'a Stmt) {
        match stmt {
            Stmt::Block(statements) => {
                self.begin_scope();
                self.resolve_stmts(statements);
                self.end_scope();
            }

            Stmt::Var { name, initializer } => {
                // declare → resolve initializer → define
                self.declare(name);
                if let Some(expr) = initializer {
                    self.resolve_expr(expr);
                }
                self.define(name);
            }

            Stmt::Function { name, function } => {
                // the name is visible *inside* its own body, for recursion
                self.declare(name);
                self.define(name);
                self.resolve_function(function);
            }

            Stmt::Expression(expr) | Stmt::Print(expr) => {
                self.resolve_expr(expr);
            }

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                // both branches, since which one runs is a runtime matter
                self.resolve_expr(condition);
                self.resolve_stmt(then_branch);
                if let Some(eb) = else_branch.as_deref() {
                    self.resolve_stmt(eb);
                }
            }

            Stmt::While { condition, body } => {
                self.resolve_expr(condition);
                self.resolve_stmt(body);
            }

            // Placement already checked by the parser.
            Stmt::Break(_) => {}

            Stmt::Return { keyword, value } => {
                if self.current_function == FunctionType::None {
                    self.errors.push(AqError::resolve(
                        keyword,
                        "Can't return from top-level code.",
                    ));
                }
                if let Some(expr) = value {
                    self.resolve_expr(expr);
                }
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Expression resolution
    // ─────────────────────────────────────────────────────────────────────────

    fn resolve_expr(&mut self, expr: &'a Expr) {
        stack::guarded(|| self.resolve_expr_node(expr))
    }

    fn resolve_expr_node(&mut self, expr: &'a Expr) {
        match expr {
            Expr::Literal(_) => {}

            Expr::Grouping(inner) => {
                self.resolve_expr(inner);
            }

            Expr::Unary { right, .. } => {
                self.resolve_expr(right);
            }

            Expr::Binary { left, right, .. } | Expr::Logical { left, right, .. } => {
                self.resolve_expr(left);
                self.resolve_expr(right);
            }

            Expr::Variable { id, name } => {
                self.resolve_use(*id, name, "Can't read local variable in its own initializer.");
            }

            Expr::Assign { id, name, value } => {
                // First resolve RHS, then bind LHS
                self.resolve_expr(value);
                self.resolve_use(
                    *id,
                    name,
                    "Can't assign to local variable in its own initializer.",
                );
            }

            Expr::Call {
                callee, arguments, ..
            } => {
                self.resolve_expr(callee);
                for arg in arguments {
                    self.resolve_expr(arg);
                }
            }

            Expr::Function(function) => {
                self.resolve_function(function);
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Function helper
    // ─────────────────────────────────────────────────────────────────────────

    /// Enter a fresh scope for a function's parameters + body.
    fn resolve_function(&mut self, function: &'a FunctionDecl) {
        let enclosing = self.current_function;
        self.current_function = FunctionType::Function;

        self.begin_scope();
        for param in &function.params {
            self.declare(param);
            self.define(param);
        }
        self.resolve_stmts(&function.body);
        self.end_scope();

        self.current_function = enclosing;
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Scope management
    // ─────────────────────────────────────────────────────────────────────────

    #[inline]
    fn begin_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    #[inline]
    fn end_scope(&mut self) {
        self.scopes.pop();
    }

    fn declare(&mut self, name: &'a Token) {
        if let Some(scope) = self.scopes.last_mut() {
            if scope.contains_key(name.lexeme.as_str()) {
                self.errors.push(AqError::resolve(
                    name,
                    "Already a variable with this name in this scope.",
                ));
                return;
            }
            scope.insert(name.lexeme.as_str(), false);
        }
    }

    fn define(&mut self, name: &'a Token) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.lexeme.as_str(), true);
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Binding‑distance helpers
    // ─────────────────────────────────────────────────────────────────────────

    /// Resolve a variable read or assignment target.
    ///
    /// When the innermost scope holds the name but its declaration is still
    /// being initialised, the use binds to the nearest enclosing local that
    /// is ready.  With no such local the initializer touches itself, and
    /// `misuse` is reported.
    fn resolve_use(&mut self, id: ExprId, name: &'a Token, misuse: &str) {
        let lexeme: &str = name.lexeme.as_str();

        let pending: bool = self
            .scopes
            .last()
            .is_some_and(|scope| scope.get(lexeme) == Some(&false));

        if !pending {
            self.resolve_local(id, name);
            return;
        }

        let outer = self
            .scopes
            .iter()
            .rev()
            .enumerate()
            .skip(1)
            .find(|(_, scope)| scope.get(lexeme) == Some(&true))
            .map(|(depth, _)| depth);

        match outer {
            Some(depth) => {
                debug!("Resolved '{}' past its own initializer at depth {}", lexeme, depth);

                self.locals.insert(id, depth);
            }
            None => {
                self.errors.push(AqError::resolve(name, misuse));
            }
        }
    }

    /// Record this variable occurrence as either:
    ///  - a local at depth `d`, or
    ///  - a global if not found in *any* scope (no entry).
    fn resolve_local(&mut self, id: ExprId, name: &'a Token) {
        // check innermost → outermost
        for (depth, scope) in self.scopes.iter().rev().enumerate() {
            if scope.contains_key(name.lexeme.as_str()) {
                debug!("Resolved '{}' at depth {}", name.lexeme, depth);

                self.locals.insert(id, depth);
                return;
            }
        }

        debug!("Resolved '{}' as global", name.lexeme);
    }
}
