use crate::ast::{Expr, FunctionDecl, LiteralValue, Stmt};

/// Renders the AST in parenthesised prefix form, e.g. `(+ 1.0 (* 2.0 3.0))`.
/// Debug aid behind `aq parse`.
pub struct AstPrinter;

impl AstPrinter {
    pub fn print_expr(expr: &Expr) -> String {
        match expr {
            // ── literals ────────────────────────────────────────────────
            Expr::Literal(lit) => match lit {
                LiteralValue::True => "true".into(),

                LiteralValue::False => "false".into(),

                LiteralValue::Nil => "nil".into(),

                LiteralValue::Str(s) => s.clone(),

                LiteralValue::Number(n) => {
                    if n.fract() == 0.0 {
                        // 3 → 3.0
                        format!("{:.1}", n)
                    } else {
                        n.to_string()
                    }
                }
            },

            // ── grouping ────────────────────────────────────────────────
            Expr::Grouping(inner) => format!("(group {})", Self::print_expr(inner)),

            // ── operators ───────────────────────────────────────────────
            Expr::Unary { operator, right } => {
                format!("({} {})", operator.lexeme, Self::print_expr(right))
            }

            Expr::Binary {
                left,
                operator,
                right,
            }
            | Expr::Logical {
                left,
                operator,
                right,
            } => format!(
                "({} {} {})",
                operator.lexeme,
                Self::print_expr(left),
                Self::print_expr(right)
            ),

            // ── variables / calls / functions ───────────────────────────
            Expr::Variable { name, .. } => name.lexeme.clone(),

            Expr::Assign { name, value, .. } => {
                format!("(= {} {})", name.lexeme, Self::print_expr(value))
            }

            Expr::Call {
                callee, arguments, ..
            } => {
                let mut s = format!("(call {}", Self::print_expr(callee));
                for arg in arguments {
                    s.push(' ');
                    s.push_str(&Self::print_expr(arg));
                }
                s.push(')');
                s
            }

            Expr::Function(function) => format!("(fun {})", Self::print_function(function)),
        }
    }

    pub fn print_stmt(stmt: &Stmt) -> String {
        match stmt {
            Stmt::Expression(expr) => format!("(; {})", Self::print_expr(expr)),

            Stmt::Print(expr) => format!("(print {})", Self::print_expr(expr)),

            Stmt::Var { name, initializer } => match initializer {
                Some(init) => format!("(var {} {})", name.lexeme, Self::print_expr(init)),
                None => format!("(var {})", name.lexeme),
            },

            Stmt::Block(statements) => Self::print_block(statements),

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => match else_branch {
                Some(else_branch) => format!(
                    "(if {} {} {})",
                    Self::print_expr(condition),
                    Self::print_stmt(then_branch),
                    Self::print_stmt(else_branch)
                ),
                None => format!(
                    "(if {} {})",
                    Self::print_expr(condition),
                    Self::print_stmt(then_branch)
                ),
            },

            Stmt::While { condition, body } => format!(
                "(while {} {})",
                Self::print_expr(condition),
                Self::print_stmt(body)
            ),

            Stmt::Break(_) => "(break)".into(),

            Stmt::Return { value, .. } => match value {
                Some(value) => format!("(return {})", Self::print_expr(value)),
                None => "(return)".into(),
            },

            Stmt::Function { name, function } => {
                format!("(fun {} {})", name.lexeme, Self::print_function(function))
            }
        }
    }

    fn print_function(function: &FunctionDecl) -> String {
        let params: Vec<&str> = function.params.iter().map(|p| p.lexeme.as_str()).collect();

        format!("({}) {}", params.join(" "), Self::print_block(&function.body))
    }

    fn print_block(statements: &[Stmt]) -> String {
        let mut s = String::from("(block");
        for stmt in statements {
            s.push(' ');
            s.push_str(&Self::print_stmt(stmt));
        }
        s.push(')');
        s
    }
}
