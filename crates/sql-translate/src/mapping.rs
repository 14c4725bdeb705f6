//! Property-to-column resolution: the resolver interface, the mapping types
//! it produces, and a map-backed resolver for simple schemas and tests.

use crate::alias::TableAliasManager;
use crate::convert::{DefaultConverter, ValueConverter};
use filter_model::{BaseType, PropertyName, Value};
use std::collections::HashMap;
use std::sync::Arc;

/// One step of the join chain required to reach a property's table from the
/// root table. Both column lists have the same arity; a multi-column join
/// renders as an AND of pairwise equalities.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Join {
    pub from_table: String,
    pub from_alias: String,
    pub from_columns: Vec<String>,
    pub to_table: String,
    pub to_alias: String,
    pub to_columns: Vec<String>,
}

impl Join {
    /// The join condition, e.g. `X1.fk1 = X2.pk1 AND X1.fk2 = X2.pk2`.
    pub fn condition_sql(&self) -> String {
        debug_assert_eq!(
            self.from_columns.len(),
            self.to_columns.len(),
            "join columns must have equal arity"
        );
        self.from_columns
            .iter()
            .zip(&self.to_columns)
            .map(|(from, to)| {
                format!("{}.{} = {}.{}", self.from_alias, from, self.to_alias, to)
            })
            .collect::<Vec<_>>()
            .join(" AND ")
    }
}

/// A column a property resolved to, plus everything needed to reference it.
#[derive(Debug, Clone)]
pub struct ColumnMapping {
    pub table_alias: String,
    pub column: String,
    pub converter: Arc<dyn ValueConverter>,
    pub spatial: bool,
    pub srid: Option<i32>,
    pub joins: Vec<Join>,
}

/// Result of resolving a property path against the relational configuration.
#[derive(Debug, Clone)]
pub enum PropertyMapping {
    /// The property's value is fixed by schema configuration rather than
    /// stored per row; renders as a typed argument, not a column.
    Constant(Value),
    Column(ColumnMapping),
}

/// Record of a property that was successfully mapped during a build, for
/// callers that project the mapped columns or report what was pushed down.
#[derive(Debug, Clone)]
pub struct MappedProperty {
    pub property: PropertyName,
    pub table_alias: String,
    pub column: String,
    pub joins: Vec<Join>,
}

/// Maps abstract property paths to the relational model.
///
/// Resolution must be deterministic for a fixed schema configuration and
/// must be safe to call from concurrent builds; each build passes its own
/// alias manager. A non-mappable path is an `Option::None`, not an error:
/// the translator turns it into an `Unmappable` failure for the enclosing
/// sub-expression.
pub trait PropertyResolver: Send + Sync {
    fn resolve(
        &self,
        prop: &PropertyName,
        aliases: &mut TableAliasManager,
    ) -> Option<PropertyMapping>;

    /// Spatial contexts may map a path differently (e.g. to a geometry
    /// column that needs dialect-specific wrapping).
    fn resolve_spatial(
        &self,
        prop: &PropertyName,
        aliases: &mut TableAliasManager,
    ) -> Option<PropertyMapping> {
        self.resolve(prop, aliases)
    }
}

/// One step of a configured join chain, before aliases are assigned.
#[derive(Debug, Clone)]
pub struct JoinStep {
    pub from_columns: Vec<String>,
    pub to_table: String,
    pub to_columns: Vec<String>,
}

impl JoinStep {
    pub fn new(from_columns: &[&str], to_table: &str, to_columns: &[&str]) -> JoinStep {
        assert_eq!(
            from_columns.len(),
            to_columns.len(),
            "join columns must have equal arity"
        );
        JoinStep {
            from_columns: from_columns.iter().map(|c| c.to_string()).collect(),
            to_table: to_table.to_string(),
            to_columns: to_columns.iter().map(|c| c.to_string()).collect(),
        }
    }
}

/// Column definition used by [`StaticResolver`].
#[derive(Debug, Clone)]
pub struct ColumnDef {
    column: String,
    ty: Option<BaseType>,
    concatenated: bool,
    spatial: bool,
    srid: Option<i32>,
    joins: Vec<JoinStep>,
}

impl ColumnDef {
    pub fn new(column: &str) -> ColumnDef {
        ColumnDef {
            column: column.to_string(),
            ty: None,
            concatenated: false,
            spatial: false,
            srid: None,
            joins: Vec::new(),
        }
    }

    pub fn typed(mut self, ty: BaseType) -> ColumnDef {
        self.ty = Some(ty);
        self
    }

    /// Marks the column as storing several logical values in concatenated,
    /// `|`-delimited form.
    pub fn concatenated(mut self) -> ColumnDef {
        self.concatenated = true;
        self
    }

    pub fn spatial(mut self, srid: i32) -> ColumnDef {
        self.spatial = true;
        self.srid = Some(srid);
        self
    }

    /// Adds a join step on the way from the root table to this column's
    /// table.
    pub fn joined(mut self, step: JoinStep) -> ColumnDef {
        self.joins.push(step);
        self
    }
}

#[derive(Debug, Clone)]
enum PropDef {
    Constant(Value),
    Column(ColumnDef),
}

/// A [`PropertyResolver`] backed by a static path-to-column map over one
/// root table. Suitable for flat schemas and for tests; richer mapping
/// configurations implement the trait themselves.
#[derive(Debug, Default)]
pub struct StaticResolver {
    root_table: String,
    props: HashMap<String, PropDef>,
}

impl StaticResolver {
    pub fn new(root_table: &str) -> StaticResolver {
        StaticResolver {
            root_table: root_table.to_string(),
            props: HashMap::new(),
        }
    }

    pub fn column(mut self, path: &str, def: ColumnDef) -> StaticResolver {
        self.props.insert(path.to_string(), PropDef::Column(def));
        self
    }

    pub fn constant(mut self, path: &str, value: Value) -> StaticResolver {
        self.props
            .insert(path.to_string(), PropDef::Constant(value));
        self
    }

    fn resolve_column(
        &self,
        prop: &PropertyName,
        def: &ColumnDef,
        aliases: &mut TableAliasManager,
    ) -> ColumnMapping {
        let mut from_table = self.root_table.clone();
        let mut from_alias = aliases.root_alias();
        let mut joins = Vec::with_capacity(def.joins.len());
        for (i, step) in def.joins.iter().enumerate() {
            // Key by property path and step so that a different path joining
            // into the same table gets its own alias.
            let to_alias = aliases.alias_for(&format!("{}#{}>{}", prop.path, i, step.to_table));
            joins.push(Join {
                from_table: from_table.clone(),
                from_alias: from_alias.clone(),
                from_columns: step.from_columns.clone(),
                to_table: step.to_table.clone(),
                to_alias: to_alias.clone(),
                to_columns: step.to_columns.clone(),
            });
            from_table = step.to_table.clone();
            from_alias = to_alias;
        }
        let converter = match def.ty {
            Some(ty) => DefaultConverter::typed(ty),
            None => DefaultConverter::new(),
        }
        .concatenated(def.concatenated);
        ColumnMapping {
            table_alias: from_alias,
            column: def.column.clone(),
            converter: converter.shared(),
            spatial: def.spatial,
            srid: def.srid,
            joins,
        }
    }
}

impl PropertyResolver for StaticResolver {
    fn resolve(
        &self,
        prop: &PropertyName,
        aliases: &mut TableAliasManager,
    ) -> Option<PropertyMapping> {
        match self.props.get(&prop.path)? {
            PropDef::Constant(value) => Some(PropertyMapping::Constant(value.clone())),
            PropDef::Column(def) => {
                Some(PropertyMapping::Column(self.resolve_column(prop, def, aliases)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_condition_renders_and_of_equalities() {
        let join = Join {
            from_table: "rivers".into(),
            from_alias: "X1".into(),
            from_columns: vec!["fk1".into(), "fk2".into()],
            to_table: "owners".into(),
            to_alias: "X2".into(),
            to_columns: vec!["pk1".into(), "pk2".into()],
        };
        assert_eq!(join.condition_sql(), "X1.fk1 = X2.pk1 AND X1.fk2 = X2.pk2");
    }

    #[test]
    fn joined_paths_mint_aliases_from_the_root() {
        let resolver = StaticResolver::new("rivers").column(
            "owner/name",
            ColumnDef::new("name").joined(JoinStep::new(&["owner_fk"], "owners", &["id"])),
        );
        let mut aliases = TableAliasManager::new();
        let mapping = resolver
            .resolve(&PropertyName::new("owner/name"), &mut aliases)
            .unwrap();
        match mapping {
            PropertyMapping::Column(col) => {
                assert_eq!(col.table_alias, "X2");
                assert_eq!(col.joins.len(), 1);
                assert_eq!(col.joins[0].from_alias, "X1");
                assert_eq!(col.joins[0].to_alias, "X2");
            }
            _ => panic!("expected column mapping"),
        }
    }

    #[test]
    fn unknown_path_is_unmappable() {
        let resolver = StaticResolver::new("rivers");
        let mut aliases = TableAliasManager::new();
        assert!(resolver
            .resolve(&PropertyName::new("nope"), &mut aliases)
            .is_none());
    }
}
