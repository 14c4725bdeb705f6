//! Defines the `Dialect` trait for database-specific SQL syntax, including
//! the lowering of spatial predicates.

use crate::error::{Result, TranslateError};
use crate::fragment::{OperationBuilder, SqlArgument, SqlFragment};
use filter_model::{BaseType, Envelope, SpatialOp, Value};

pub trait Dialect: Send + Sync {
    /// Returns the name of the dialect (e.g. "PostgreSQL", "MySQL").
    fn name(&self) -> &str;

    /// Returns the placeholder for a parameterized query.
    ///
    /// - PostgreSQL uses `$1`, `$2`, etc.
    /// - MySQL uses `?`
    fn placeholder(&self, index: usize) -> String;

    /// The function wrapped around both sides of a case-insensitive
    /// comparison.
    fn lower_function(&self) -> &str {
        "LOWER"
    }

    /// The escape character of the dialect's LIKE syntax.
    fn like_escape_char(&self) -> char {
        '\\'
    }

    /// Lowers a spatial operator against the already-resolved geometry
    /// column fragment.
    fn spatial_predicate(&self, op: &SpatialOp, prop: SqlFragment) -> Result<SqlFragment>;
}

fn column_srid(prop: &SqlFragment, envelope: &Envelope) -> Option<i32> {
    match prop {
        SqlFragment::Column(col) => col.srid.or(envelope.srid),
        _ => envelope.srid,
    }
}

#[derive(Debug, Clone)]
pub struct Postgres;

impl Postgres {
    fn envelope(&self, builder: &mut OperationBuilder, env: &Envelope, srid: Option<i32>) {
        builder.sql("ST_MakeEnvelope(");
        for (i, coord) in [env.min_x, env.min_y, env.max_x, env.max_y].iter().enumerate() {
            if i > 0 {
                builder.sql(",");
            }
            builder.expr(SqlFragment::Argument(SqlArgument::typed(
                Value::Float(*coord),
                BaseType::Double,
            )));
        }
        if let Some(srid) = srid {
            builder.sql(&format!(",{srid}"));
        }
        builder.sql(")");
    }
}

impl Dialect for Postgres {
    fn name(&self) -> &str {
        "PostgreSQL"
    }

    fn placeholder(&self, index: usize) -> String {
        format!("${}", index + 1)
    }

    fn spatial_predicate(&self, op: &SpatialOp, prop: SqlFragment) -> Result<SqlFragment> {
        let mut builder = OperationBuilder::boolean();
        match op {
            SpatialOp::Bbox { envelope, .. } => {
                let srid = column_srid(&prop, envelope);
                builder.expr(prop).sql(" && ");
                self.envelope(&mut builder, envelope, srid);
            }
            SpatialOp::Intersects { envelope, .. } => {
                let srid = column_srid(&prop, envelope);
                builder.sql("ST_Intersects(").expr(prop).sql(",");
                self.envelope(&mut builder, envelope, srid);
                builder.sql(")");
            }
        }
        Ok(builder.build())
    }
}

#[derive(Debug, Clone)]
pub struct MySql;

impl MySql {
    fn geometry(&self, builder: &mut OperationBuilder, env: &Envelope, srid: Option<i32>) {
        builder.sql("ST_GeomFromText(");
        builder.expr(SqlFragment::Argument(SqlArgument::typed(
            Value::String(env.to_wkt()),
            BaseType::String,
        )));
        if let Some(srid) = srid {
            builder.sql(&format!(",{srid}"));
        }
        builder.sql(")");
    }
}

impl Dialect for MySql {
    fn name(&self) -> &str {
        "MySQL"
    }

    fn placeholder(&self, _index: usize) -> String {
        "?".into()
    }

    fn spatial_predicate(&self, op: &SpatialOp, prop: SqlFragment) -> Result<SqlFragment> {
        let mut builder = OperationBuilder::boolean();
        match op {
            SpatialOp::Bbox { envelope, .. } => {
                let srid = column_srid(&prop, envelope);
                builder.sql("MBRIntersects(").expr(prop).sql(",");
                self.geometry(&mut builder, envelope, srid);
                builder.sql(")");
            }
            SpatialOp::Intersects { envelope, .. } => {
                let srid = column_srid(&prop, envelope);
                builder.sql("ST_Intersects(").expr(prop).sql(",");
                self.geometry(&mut builder, envelope, srid);
                builder.sql(")");
            }
        }
        Ok(builder.build())
    }
}

/// A dialect stub for callers that only need ANSI placeholders and no
/// spatial support (e.g. plain attribute stores).
#[derive(Debug, Clone)]
pub struct Ansi;

impl Dialect for Ansi {
    fn name(&self) -> &str {
        "ANSI"
    }

    fn placeholder(&self, _index: usize) -> String {
        "?".into()
    }

    fn spatial_predicate(&self, _op: &SpatialOp, _prop: SqlFragment) -> Result<SqlFragment> {
        Err(TranslateError::unmappable(
            "spatial predicates are not supported by the ANSI dialect",
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert::DefaultConverter;
    use crate::fragment::SqlColumn;
    use filter_model::PropertyName;

    fn geom_column(srid: Option<i32>) -> SqlFragment {
        SqlFragment::Column(SqlColumn {
            table_alias: "X1".into(),
            column: "geom".into(),
            converter: DefaultConverter::new().shared(),
            spatial: true,
            srid,
        })
    }

    #[test]
    fn postgres_bbox_uses_overlap_operator() {
        let op = SpatialOp::Bbox {
            prop: PropertyName::new("geom"),
            envelope: Envelope::new(1.0, 2.0, 3.0, 4.0),
        };
        let frag = Postgres
            .spatial_predicate(&op, geom_column(Some(4326)))
            .unwrap();
        let (sql, params) = frag.to_sql(&Postgres);
        assert_eq!(sql, "X1.geom && ST_MakeEnvelope($1,$2,$3,$4,4326)");
        assert_eq!(params.len(), 4);
    }

    #[test]
    fn mysql_bbox_binds_wkt() {
        let op = SpatialOp::Bbox {
            prop: PropertyName::new("geom"),
            envelope: Envelope::new(1.0, 2.0, 3.0, 4.0),
        };
        let frag = MySql.spatial_predicate(&op, geom_column(None)).unwrap();
        let (sql, params) = frag.to_sql(&MySql);
        assert_eq!(sql, "MBRIntersects(X1.geom,ST_GeomFromText(?))");
        assert_eq!(
            params,
            vec![Value::String(
                "POLYGON((1 2,3 2,3 4,1 4,1 2))".into()
            )]
        );
    }
}
