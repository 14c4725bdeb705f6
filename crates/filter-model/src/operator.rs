//! The boolean operator tree that makes up a filter.

use crate::expr::Expr;
use crate::spatial::SpatialOp;
use crate::temporal::TemporalOp;
use serde::{Deserialize, Serialize};

/// A declarative, database-agnostic filter: a boolean expression tree over
/// comparison, logical, spatial and temporal operators.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum Filter {
    Comparison(ComparisonOp),
    Logical(LogicalOp),
    Spatial(SpatialOp),
    Temporal(TemporalOp),
}

/// How a comparison treats properties with multiple values per object. Only
/// `Any` has SQL semantics; the others are logged and ignored.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum MatchAction {
    Any,
    All,
    One,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ComparisonOp {
    pub kind: ComparisonKind,
    /// When false, both sides are wrapped in the dialect's case-normalizing
    /// function before comparison.
    pub match_case: bool,
    pub match_action: Option<MatchAction>,
}

impl ComparisonOp {
    pub fn new(kind: ComparisonKind) -> ComparisonOp {
        ComparisonOp {
            kind,
            match_case: true,
            match_action: None,
        }
    }

    pub fn match_case(mut self, match_case: bool) -> ComparisonOp {
        self.match_case = match_case;
        self
    }

    pub fn match_action(mut self, action: MatchAction) -> ComparisonOp {
        self.match_action = Some(action);
        self
    }
}

/// The comparison sub-kinds with their operands. Exhaustive on purpose:
/// adding an operator forces every translator to handle it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum ComparisonKind {
    Between {
        expr: Expr,
        lower: Expr,
        upper: Expr,
    },
    Equal {
        a: Expr,
        b: Expr,
    },
    NotEqual {
        a: Expr,
        b: Expr,
    },
    LessThan {
        a: Expr,
        b: Expr,
    },
    LessThanOrEqual {
        a: Expr,
        b: Expr,
    },
    GreaterThan {
        a: Expr,
        b: Expr,
    },
    GreaterThanOrEqual {
        a: Expr,
        b: Expr,
    },
    /// `prop` matched against a pattern using the given wildcard,
    /// single-char and escape characters.
    Like {
        prop: Expr,
        pattern: Expr,
        wildcard: char,
        single_char: char,
        escape_char: char,
    },
    IsNull {
        prop: Expr,
    },
    /// True when the property is present but explicitly marked nil. The
    /// operand must be a property reference.
    IsNil {
        prop: Expr,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum LogicalOp {
    And(Vec<Filter>),
    Or(Vec<Filter>),
    Not(Box<Filter>),
}

impl Filter {
    pub fn and(filters: Vec<Filter>) -> Filter {
        Filter::Logical(LogicalOp::And(filters))
    }

    pub fn or(filters: Vec<Filter>) -> Filter {
        Filter::Logical(LogicalOp::Or(filters))
    }

    pub fn not(filter: Filter) -> Filter {
        Filter::Logical(LogicalOp::Not(Box::new(filter)))
    }

    pub fn comparison(kind: ComparisonKind) -> Filter {
        Filter::Comparison(ComparisonOp::new(kind))
    }
}
