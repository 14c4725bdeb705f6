//! Temporal operators. They are carried through the model but have no SQL
//! lowering; the translator reports them unsupported and falls back to
//! in-memory evaluation.

use crate::expr::Expr;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum TemporalKind {
    After,
    Before,
    During,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TemporalOp {
    pub kind: TemporalKind,
    pub a: Expr,
    pub b: Expr,
}
