//! Registry of filter functions: which ones can be pushed down as SQL
//! function calls, and which ones can be evaluated in memory for constant
//! folding.

use crate::error::{Result, TranslateError};
use crate::fragment::{OperationBuilder, SqlFragment};
use filter_model::Value;
use std::collections::HashMap;

/// Type alias for SQL lowering strategies: receives the already-translated
/// argument fragments and emits a function-call fragment.
pub type SqlLowering = fn(&str, Vec<SqlFragment>) -> Result<SqlFragment>;

/// Type alias for in-memory evaluation, used for constant folding.
pub type EvalImpl = fn(&[Value]) -> Result<Value>;

#[derive(Clone)]
struct FunctionDef {
    sql: Option<SqlLowering>,
    eval: Option<EvalImpl>,
}

/// Registry of all known filter functions.
///
/// A function may have a SQL lowering, an in-memory evaluation, or both.
/// Lookup is case-insensitive.
pub struct FunctionRegistry {
    functions: HashMap<String, FunctionDef>,
}

impl FunctionRegistry {
    /// Create a new function registry with all built-in functions.
    pub fn new() -> Self {
        let mut registry = Self {
            functions: HashMap::new(),
        };

        registry.register("lower", Some(lower_call as SqlLowering), Some(eval_lower));
        registry.register("upper", Some(lower_call as SqlLowering), Some(eval_upper));
        registry.register("abs", Some(lower_call as SqlLowering), Some(eval_abs));
        registry.register("round", Some(lower_call as SqlLowering), Some(eval_round));
        registry.register("concat", Some(lower_call as SqlLowering), Some(eval_concat));

        registry
    }

    /// A registry with no functions at all; useful for backends that forbid
    /// any function pushdown.
    pub fn empty() -> Self {
        Self {
            functions: HashMap::new(),
        }
    }

    pub fn register(&mut self, name: &str, sql: Option<SqlLowering>, eval: Option<EvalImpl>) {
        self.functions
            .insert(name.to_lowercase(), FunctionDef { sql, eval });
    }

    /// The SQL lowering for `name`, if the dialect-side function is known.
    pub fn sql_lowering(&self, name: &str) -> Option<SqlLowering> {
        self.functions.get(&name.to_lowercase())?.sql
    }

    /// Evaluates `name` in memory, for constant folding.
    pub fn call(&self, name: &str, args: &[Value]) -> Result<Value> {
        let eval = self
            .functions
            .get(&name.to_lowercase())
            .and_then(|def| def.eval)
            .ok_or_else(|| {
                TranslateError::unmappable(format!("no in-memory evaluation for function '{name}'"))
            })?;
        eval(args)
    }

    pub fn has_function(&self, name: &str) -> bool {
        self.functions.contains_key(&name.to_lowercase())
    }
}

impl Default for FunctionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Generic lowering: `NAME(arg1, arg2, …)` with the name upper-cased.
pub fn lower_call(name: &str, args: Vec<SqlFragment>) -> Result<SqlFragment> {
    let mut builder = OperationBuilder::new();
    builder.sql(&name.to_uppercase()).sql("(");
    for (i, arg) in args.into_iter().enumerate() {
        if i > 0 {
            builder.sql(",");
        }
        builder.expr(arg);
    }
    builder.sql(")");
    Ok(builder.build())
}

fn single_string(name: &str, args: &[Value]) -> Result<String> {
    match args {
        [v] => v.as_string().ok_or_else(|| {
            TranslateError::invalid(format!("{name} expects a string-convertible argument"))
        }),
        _ => Err(TranslateError::invalid(format!(
            "{name} expects exactly one argument"
        ))),
    }
}

fn eval_lower(args: &[Value]) -> Result<Value> {
    Ok(Value::String(single_string("lower", args)?.to_lowercase()))
}

fn eval_upper(args: &[Value]) -> Result<Value> {
    Ok(Value::String(single_string("upper", args)?.to_uppercase()))
}

fn eval_abs(args: &[Value]) -> Result<Value> {
    match args {
        [Value::Int(v)] => Ok(Value::Int(v.abs())),
        [Value::Float(v)] => Ok(Value::Float(v.abs())),
        _ => Err(TranslateError::invalid("abs expects one numeric argument")),
    }
}

fn eval_round(args: &[Value]) -> Result<Value> {
    match args {
        [Value::Int(v)] => Ok(Value::Int(*v)),
        [Value::Float(v)] => Ok(Value::Float(v.round())),
        _ => Err(TranslateError::invalid("round expects one numeric argument")),
    }
}

fn eval_concat(args: &[Value]) -> Result<Value> {
    let mut out = String::new();
    for arg in args {
        let part = arg.as_string().ok_or_else(|| {
            TranslateError::invalid("concat expects string-convertible arguments")
        })?;
        out.push_str(&part);
    }
    Ok(Value::String(out))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::MySql;
    use crate::fragment::SqlArgument;

    #[test]
    fn registry_has_builtin_functions() {
        let registry = FunctionRegistry::new();
        assert!(registry.has_function("lower"));
        assert!(registry.has_function("UPPER"));
        assert!(!registry.has_function("nonexistent"));
    }

    #[test]
    fn builtin_evaluation() {
        let registry = FunctionRegistry::new();
        assert_eq!(
            registry.call("upper", &[Value::String("ab".into())]).unwrap(),
            Value::String("AB".into())
        );
        assert_eq!(registry.call("abs", &[Value::Int(-3)]).unwrap(), Value::Int(3));
        assert_eq!(
            registry
                .call("concat", &[Value::String("a".into()), Value::Int(1)])
                .unwrap(),
            Value::String("a1".into())
        );
    }

    #[test]
    fn generic_lowering_renders_call() {
        let frag = lower_call(
            "round",
            vec![SqlFragment::Argument(SqlArgument::untyped(Value::Float(1.5)))],
        )
        .unwrap();
        let (sql, params) = frag.to_sql(&MySql);
        assert_eq!(sql, "ROUND(?)");
        assert_eq!(params, vec![Value::Float(1.5)]);
    }
}
