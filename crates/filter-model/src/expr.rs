//! Scalar expressions that appear as operands of comparison operators.

use crate::path::PropertyName;
use crate::value::Value;
use serde::{Deserialize, Serialize};

/// A scalar expression over named properties.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum Expr {
    /// A literal value. `Value::Null` is legal and denotes an explicit SQL
    /// NULL argument; only primitive values can be pushed down.
    Literal(Value),

    /// A reference to a queryable property.
    Property(PropertyName),

    Add(Box<Expr>, Box<Expr>),
    Sub(Box<Expr>, Box<Expr>),
    Mul(Box<Expr>, Box<Expr>),
    Div(Box<Expr>, Box<Expr>),

    /// A named function applied to ordered argument expressions.
    Function { name: String, args: Vec<Expr> },
}

impl Expr {
    pub fn literal(value: Value) -> Expr {
        Expr::Literal(value)
    }

    pub fn property(path: impl Into<String>) -> Expr {
        Expr::Property(PropertyName::new(path))
    }

    pub fn function(name: impl Into<String>, args: Vec<Expr>) -> Expr {
        Expr::Function {
            name: name.into(),
            args,
        }
    }

    /// Nesting depth of this expression tree.
    pub fn depth(&self) -> usize {
        match self {
            Expr::Literal(_) | Expr::Property(_) => 1,
            Expr::Add(a, b) | Expr::Sub(a, b) | Expr::Mul(a, b) | Expr::Div(a, b) => {
                1 + a.depth().max(b.depth())
            }
            Expr::Function { args, .. } => {
                1 + args.iter().map(Expr::depth).max().unwrap_or(0)
            }
        }
    }
}
