//! The output representation of a translation: parameterized argument nodes,
//! raw column references and composite operations, plus the renderer that
//! turns a fragment tree into SQL text and an ordered bind-argument list.

use crate::convert::{DefaultConverter, ValueConverter};
use crate::dialect::Dialect;
use filter_model::{BaseType, Value};
use std::sync::Arc;

/// A bind argument: a value substituted at a placeholder position, never
/// concatenated into the SQL text.
#[derive(Debug, Clone)]
pub struct SqlArgument {
    pub value: Value,
    ty: Option<BaseType>,
    converter: Arc<dyn ValueConverter>,
}

impl SqlArgument {
    /// An untyped argument; its type is inferred from the other side of the
    /// enclosing comparison.
    pub fn untyped(value: Value) -> SqlArgument {
        SqlArgument {
            value,
            ty: None,
            converter: DefaultConverter::new().shared(),
        }
    }

    pub fn typed(value: Value, ty: BaseType) -> SqlArgument {
        SqlArgument {
            value,
            ty: Some(ty),
            converter: DefaultConverter::typed(ty).shared(),
        }
    }

    pub fn with_converter(value: Value, converter: Arc<dyn ValueConverter>) -> SqlArgument {
        SqlArgument {
            value,
            ty: converter.base_type(),
            converter,
        }
    }

    /// The value actually bound at the placeholder.
    pub fn bind_value(&self) -> Value {
        self.converter.to_argument(&self.value)
    }
}

/// A reference to a physical column through its table alias.
#[derive(Debug, Clone)]
pub struct SqlColumn {
    pub table_alias: String,
    pub column: String,
    pub converter: Arc<dyn ValueConverter>,
    pub spatial: bool,
    pub srid: Option<i32>,
}

impl SqlColumn {
    pub fn qualified(&self) -> String {
        format!("{}.{}", self.table_alias, self.column)
    }
}

#[derive(Debug, Clone)]
pub enum OperationPart {
    Sql(String),
    Expr(SqlFragment),
}

/// A composite operation: interleaved SQL text and child fragments.
#[derive(Debug, Clone)]
pub struct SqlOperation {
    pub ty: Option<BaseType>,
    pub parts: Vec<OperationPart>,
}

#[derive(Debug, Clone)]
pub enum SqlFragment {
    Argument(SqlArgument),
    Column(SqlColumn),
    Operation(SqlOperation),
}

impl SqlFragment {
    pub fn base_type(&self) -> Option<BaseType> {
        match self {
            SqlFragment::Argument(arg) => arg.ty.or_else(|| arg.converter.base_type()),
            SqlFragment::Column(col) => col.converter.base_type(),
            SqlFragment::Operation(op) => op.ty,
        }
    }

    /// Adopts the base type of `other` if this fragment is an untyped
    /// argument. Columns and operations keep their own type.
    pub fn cast_from(&mut self, other: &SqlFragment) {
        if let SqlFragment::Argument(arg) = self
            && arg.ty.is_none()
        {
            arg.ty = other.base_type();
        }
    }

    /// Whether this fragment refers (directly or through children) to a
    /// column that stores several logical values in concatenated form.
    pub fn is_multi_valued(&self) -> bool {
        match self {
            SqlFragment::Argument(arg) => arg.converter.is_concatenated(),
            SqlFragment::Column(col) => col.converter.is_concatenated(),
            SqlFragment::Operation(op) => op.parts.iter().any(|part| match part {
                OperationPart::Expr(frag) => frag.is_multi_valued(),
                OperationPart::Sql(_) => false,
            }),
        }
    }

    pub fn is_spatial(&self) -> bool {
        matches!(self, SqlFragment::Column(col) if col.spatial)
    }

    pub fn is_argument(&self) -> bool {
        matches!(self, SqlFragment::Argument(_))
    }

    /// Renders this fragment to SQL text plus bind arguments in placeholder
    /// order.
    pub fn to_sql(&self, dialect: &dyn Dialect) -> (String, Vec<Value>) {
        let mut renderer = Renderer::new(dialect);
        self.render(&mut renderer);
        renderer.finish()
    }
}

/// Assembles a composite operation from SQL text and child fragments.
#[derive(Debug, Default)]
pub struct OperationBuilder {
    ty: Option<BaseType>,
    parts: Vec<OperationPart>,
}

impl OperationBuilder {
    pub fn new() -> OperationBuilder {
        OperationBuilder::default()
    }

    /// A builder for an operation of boolean type (a predicate).
    pub fn boolean() -> OperationBuilder {
        OperationBuilder {
            ty: Some(BaseType::Boolean),
            parts: Vec::new(),
        }
    }

    pub fn sql(&mut self, text: &str) -> &mut OperationBuilder {
        self.parts.push(OperationPart::Sql(text.to_string()));
        self
    }

    pub fn expr(&mut self, fragment: SqlFragment) -> &mut OperationBuilder {
        self.parts.push(OperationPart::Expr(fragment));
        self
    }

    pub fn build(self) -> SqlFragment {
        SqlFragment::Operation(SqlOperation {
            ty: self.ty,
            parts: self.parts,
        })
    }
}

/// A trait for any fragment node that can be rendered into a SQL string.
pub trait Render {
    fn render(&self, renderer: &mut Renderer);
}

/// Accumulates the SQL string and the bind parameters during rendering.
pub struct Renderer<'a> {
    pub sql: String,
    pub params: Vec<Value>,
    pub dialect: &'a dyn Dialect,
}

impl<'a> Renderer<'a> {
    pub fn new(dialect: &'a dyn Dialect) -> Self {
        Renderer {
            sql: String::new(),
            params: Vec::new(),
            dialect,
        }
    }

    /// Consumes the renderer and returns the final SQL string and parameters.
    pub fn finish(self) -> (String, Vec<Value>) {
        (self.sql, self.params)
    }

    pub fn add_param(&mut self, value: Value) {
        self.params.push(value);
        let placeholder = self.dialect.placeholder(self.params.len() - 1);
        self.sql.push_str(&placeholder);
    }
}

impl Render for SqlFragment {
    fn render(&self, r: &mut Renderer) {
        match self {
            SqlFragment::Argument(arg) => r.add_param(arg.bind_value()),
            SqlFragment::Column(col) => r.sql.push_str(&col.qualified()),
            SqlFragment::Operation(op) => {
                for part in &op.parts {
                    match part {
                        OperationPart::Sql(text) => r.sql.push_str(text),
                        OperationPart::Expr(frag) => frag.render(r),
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::{MySql, Postgres};

    fn column(alias: &str, name: &str) -> SqlFragment {
        SqlFragment::Column(SqlColumn {
            table_alias: alias.to_string(),
            column: name.to_string(),
            converter: DefaultConverter::new().shared(),
            spatial: false,
            srid: None,
        })
    }

    #[test]
    fn params_follow_placeholder_order() {
        let mut builder = OperationBuilder::boolean();
        builder
            .sql("(")
            .expr(SqlFragment::Argument(SqlArgument::untyped(Value::Int(10))))
            .sql(" <= ")
            .expr(column("X1", "area"))
            .sql(" AND ")
            .expr(column("X1", "area"))
            .sql(" <= ")
            .expr(SqlFragment::Argument(SqlArgument::untyped(Value::Int(100))))
            .sql(")");
        let (sql, params) = builder.build().to_sql(&MySql);
        assert_eq!(sql, "(? <= X1.area AND X1.area <= ?)");
        assert_eq!(params, vec![Value::Int(10), Value::Int(100)]);
        assert_eq!(sql.matches('?').count(), params.len());
    }

    #[test]
    fn postgres_placeholders_are_numbered() {
        let mut builder = OperationBuilder::boolean();
        builder
            .expr(column("X1", "name"))
            .sql(" IN (")
            .expr(SqlFragment::Argument(SqlArgument::untyped(Value::Int(1))))
            .sql(", ")
            .expr(SqlFragment::Argument(SqlArgument::untyped(Value::Int(2))))
            .sql(")");
        let (sql, params) = builder.build().to_sql(&Postgres);
        assert_eq!(sql, "X1.name IN ($1, $2)");
        assert_eq!(params.len(), 2);
    }

    #[test]
    fn multi_valued_flag_propagates_through_operations() {
        let col = SqlFragment::Column(SqlColumn {
            table_alias: "X1".into(),
            column: "names".into(),
            converter: DefaultConverter::new().concatenated(true).shared(),
            spatial: false,
            srid: None,
        });
        let mut builder = OperationBuilder::new();
        builder.sql("LOWER(").expr(col).sql(")");
        assert!(builder.build().is_multi_valued());
    }

    #[test]
    fn untyped_argument_adopts_type_from_other_side() {
        let mut arg = SqlFragment::Argument(SqlArgument::untyped(Value::Null));
        let typed = SqlFragment::Argument(SqlArgument::typed(
            Value::Int(1),
            BaseType::Integer,
        ));
        arg.cast_from(&typed);
        assert_eq!(arg.base_type(), Some(BaseType::Integer));
    }
}
