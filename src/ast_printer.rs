use crate::ast::{Expr, LiteralValue};

/// Converts an expression to the Crafting‑Interpreters prefix form, used by
/// the `parse` command for debugging.
pub struct AstPrinter;

impl AstPrinter {
    pub fn print(expr: &Expr<'_>) -> String {
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

            Expr::Grouping(inner) => format!("(group {})", Self::print(inner)),

            Expr::Unary { operator, right } => {
                format!("({} {})", operator.lexeme, Self::print(right))
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
                Self::print(left),
                Self::print(right)
            ),

            Expr::Conditional {
                condition,
                then_branch,
                else_branch,
            } => format!(
                "(?: {} {} {})",
                Self::print(condition),
                Self::print(then_branch),
                Self::print(else_branch)
            ),

            Expr::Variable { name, .. } => name.lexeme.into(),

            Expr::Assign { name, value, .. } => {
                format!("(= {} {})", name.lexeme, Self::print(value))
            }

            Expr::Call {
                callee, arguments, ..
            } => {
                let mut s = format!("(call {}", Self::print(callee));
                for arg in arguments {
                    s.push(' ');
                    s.push_str(&Self::print(arg));
                }
                s.push(')');
                s
            }

            Expr::Get { object, name } => format!("(. {} {})", Self::print(object), name.lexeme),

            Expr::Set {
                object,
                name,
                value,
            } => format!(
                "(= (. {} {}) {})",
                Self::print(object),
                name.lexeme,
                Self::print(value)
            ),

            Expr::This { .. } => "this".into(),
        }
    }
}
