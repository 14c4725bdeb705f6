//! Builds SQL WHERE and ORDER BY fragments from a filter and sort criteria.
//!
//! The generated fragments are sometimes not sufficient to guarantee that the
//! result set only contains the targeted rows or keeps the requested order:
//! when a property is not mappable to a column, the build degrades to a
//! bounding-box pre-filter (if one can be extracted from the filter) or to no
//! WHERE clause at all, and reports the original filter/sort criteria back as
//! post-filter/post-sort to be applied in memory. Filtering is performed
//! completely by the database *or* completely by the post-filter, never
//! partially by each.

use crate::alias::TableAliasManager;
use crate::convert::DefaultConverter;
use crate::dialect::Dialect;
use crate::error::{Result, TranslateError};
use crate::fragment::{OperationBuilder, SqlArgument, SqlColumn, SqlFragment};
use crate::functions::FunctionRegistry;
use crate::like::{self, LikePattern};
use crate::mapping::{MappedProperty, PropertyMapping, PropertyResolver};
use filter_model::{
    extract_prefilter_bbox, BaseType, ComparisonKind, ComparisonOp, Expr, Filter, LogicalOp,
    MatchAction, PropertyName, SortKey, SpatialOp, Value, XSI_NS,
};
use tracing::{debug, warn};

/// Default filter pattern convention used when rewriting equality against a
/// concatenated column as a LIKE test.
const WILDCARD: char = '*';
const SINGLE_CHAR: char = '?';
const ESCAPE_CHAR: char = '\\';

/// Rewrites a property path for an IsNil test. The convention is
/// schema-specific, so the policy is injectable through
/// [`TranslateOptions::nil_rewrite`].
pub type NilRewrite = fn(&PropertyName) -> PropertyName;

/// The default IsNil rewrite: append the `xsi:nil` attribute step.
pub fn xsi_nil_rewrite(prop: &PropertyName) -> PropertyName {
    prop.appended("/@xsi:nil", "xsi", XSI_NS)
}

#[derive(Debug, Clone, Copy)]
pub struct TranslateOptions {
    /// Filters nested deeper than this are rejected before translation to
    /// bound stack usage.
    pub max_depth: usize,
    pub nil_rewrite: NilRewrite,
}

impl Default for TranslateOptions {
    fn default() -> Self {
        TranslateOptions {
            max_depth: 64,
            nil_rewrite: xsi_nil_rewrite,
        }
    }
}

/// How much of the filter ended up in the WHERE clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MappingState {
    /// WHERE clause and filter are logically equivalent.
    FullyMapped,
    /// WHERE clause holds a bounding-box over-approximation; the full filter
    /// must be re-applied in memory.
    Degraded,
    /// Nothing could be pushed down; the full filter applies in memory.
    FullyResidual,
}

/// The end product of one build.
#[derive(Debug)]
pub struct Translation {
    pub where_clause: Option<SqlFragment>,
    pub order_by: Option<SqlFragment>,
    /// Constraints not represented in `where_clause`; together they are
    /// logically equivalent to the original filter.
    pub post_filter: Option<Filter>,
    /// Sort criteria not represented in `order_by`.
    pub post_sort: Option<Vec<SortKey>>,
    /// All properties that resolved to columns during the build, with their
    /// join chains, for callers that project them or assemble the FROM part.
    pub mapped_properties: Vec<MappedProperty>,
    /// The alias manager of this build; callers may mint further aliases for
    /// surrounding SQL.
    pub aliases: TableAliasManager,
}

impl Translation {
    pub fn state(&self) -> MappingState {
        match (&self.where_clause, &self.post_filter) {
            (_, None) => MappingState::FullyMapped,
            (Some(_), Some(_)) => MappingState::Degraded,
            (None, Some(_)) => MappingState::FullyResidual,
        }
    }
}

/// Translates one filter (and sort criteria) into SQL fragments.
///
/// A builder is single-use: it owns the alias assignments and the mapped
/// property records of exactly one build. The resolver and dialect are
/// read-only and may be shared between concurrent builds.
pub struct WhereBuilder<'a> {
    dialect: &'a dyn Dialect,
    resolver: &'a dyn PropertyResolver,
    functions: &'a FunctionRegistry,
    options: TranslateOptions,
    aliases: TableAliasManager,
    mapped: Vec<MappedProperty>,
}

impl<'a> WhereBuilder<'a> {
    pub fn new(
        dialect: &'a dyn Dialect,
        resolver: &'a dyn PropertyResolver,
        functions: &'a FunctionRegistry,
    ) -> Self {
        WhereBuilder {
            dialect,
            resolver,
            functions,
            options: TranslateOptions::default(),
            aliases: TableAliasManager::new(),
            mapped: Vec::new(),
        }
    }

    pub fn with_options(mut self, options: TranslateOptions) -> Self {
        self.options = options;
        self
    }

    /// Builds the WHERE and ORDER BY fragments.
    ///
    /// With `allow_partial` set, an unmappable sub-expression degrades the
    /// build per the fallback policy; without it, the `Unmappable` error is
    /// returned to the caller. Invalid input fails the build either way.
    pub fn build(
        mut self,
        filter: Option<&Filter>,
        sort: &[SortKey],
        allow_partial: bool,
    ) -> Result<Translation> {
        if let Some(filter) = filter
            && filter.depth() > self.options.max_depth
        {
            return Err(TranslateError::invalid(format!(
                "filter nesting depth exceeds the configured maximum of {}",
                self.options.max_depth
            )));
        }

        let mut where_clause = None;
        let mut post_filter = None;
        if let Some(filter) = filter {
            match self.translate_filter(filter) {
                Ok(fragment) => where_clause = Some(fragment),
                Err(err) if err.is_unmappable() => {
                    if !allow_partial {
                        return Err(err);
                    }
                    debug!(
                        "unable to map full filter to WHERE clause ({err}), \
                         trying mapping of bbox constraint only"
                    );
                    match extract_prefilter_bbox(filter) {
                        Some(bbox) => match self.translate_spatial(&bbox) {
                            Ok(fragment) => where_clause = Some(fragment),
                            Err(err) if err.is_unmappable() => {
                                warn!(
                                    "unable to map any filter constraints to WHERE clause \
                                     ({err}), falling back to full in-memory filtering"
                                );
                            }
                            Err(err) => return Err(err),
                        },
                        None => {
                            warn!(
                                "no bbox constraint available for pre-filtering, \
                                 falling back to full in-memory filtering"
                            );
                        }
                    }
                    post_filter = Some(filter.clone());
                }
                Err(err) => return Err(err),
            }
        }

        let mut order_by = None;
        let mut post_sort = None;
        if !sort.is_empty() {
            match self.translate_sort(sort) {
                Ok(fragment) => order_by = Some(fragment),
                Err(err) if err.is_unmappable() => {
                    if !allow_partial {
                        return Err(err);
                    }
                    warn!(
                        "unable to map sort criteria to ORDER BY clause ({err}); \
                         using all sort criteria for the post-sorting step, \
                         partial backend ordering is not supported"
                    );
                    post_sort = Some(sort.to_vec());
                }
                Err(err) => return Err(err),
            }
        }

        Ok(Translation {
            where_clause,
            order_by,
            post_filter,
            post_sort,
            mapped_properties: self.mapped,
            aliases: self.aliases,
        })
    }

    fn translate_filter(&mut self, filter: &Filter) -> Result<SqlFragment> {
        match filter {
            Filter::Comparison(op) => self.translate_comparison(op),
            Filter::Logical(op) => self.translate_logical(op),
            Filter::Spatial(op) => self.translate_spatial(op),
            Filter::Temporal(op) => {
                warn!("mapping of temporal operator {:?} to SQL is not supported", op.kind);
                Err(TranslateError::unmappable(
                    "temporal operators cannot be mapped to SQL",
                ))
            }
        }
    }

    fn translate_logical(&mut self, op: &LogicalOp) -> Result<SqlFragment> {
        let mut builder = OperationBuilder::boolean();
        match op {
            LogicalOp::And(children) | LogicalOp::Or(children) => {
                if children.is_empty() {
                    return Err(TranslateError::invalid(
                        "logical operator without child operators",
                    ));
                }
                let joiner = match op {
                    LogicalOp::And(_) => " AND ",
                    _ => " OR ",
                };
                builder.sql("(");
                for (i, child) in children.iter().enumerate() {
                    if i > 0 {
                        builder.sql(joiner);
                    }
                    builder.expr(self.translate_filter(child)?);
                }
                builder.sql(")");
            }
            LogicalOp::Not(child) => {
                builder.sql("NOT (");
                builder.expr(self.translate_filter(child)?);
                builder.sql(")");
            }
        }
        Ok(builder.build())
    }

    fn translate_comparison(&mut self, op: &ComparisonOp) -> Result<SqlFragment> {
        if let Some(action) = op.match_action
            && action != MatchAction::Any
        {
            warn!(
                "mapping of comparisons with matchAction={action:?} to SQL is not \
                 implemented; treating as Any"
            );
        }

        match &op.kind {
            ComparisonKind::Between { expr, lower, upper } => {
                let mut lower = self.translate_expr_single(lower)?;
                let mut value = self.translate_expr_single(expr)?;
                let mut upper = self.translate_expr_single(upper)?;
                infer_type3(&mut lower, &mut value, &mut upper);
                let mut builder = OperationBuilder::boolean();
                builder.sql("(");
                self.add_expression(&mut builder, lower, op.match_case);
                builder.sql(" <= ");
                self.add_expression(&mut builder, value.clone(), op.match_case);
                builder.sql(" AND ");
                self.add_expression(&mut builder, value, op.match_case);
                builder.sql(" <= ");
                self.add_expression(&mut builder, upper, op.match_case);
                builder.sql(")");
                Ok(builder.build())
            }
            ComparisonKind::Equal { a, b } => self.translate_equality(a, b, op.match_case, false),
            ComparisonKind::NotEqual { a, b } => {
                self.translate_equality(a, b, op.match_case, true)
            }
            ComparisonKind::LessThan { a, b } => self.translate_ordering(a, b, " < ", op.match_case),
            ComparisonKind::LessThanOrEqual { a, b } => {
                self.translate_ordering(a, b, " <= ", op.match_case)
            }
            ComparisonKind::GreaterThan { a, b } => {
                self.translate_ordering(a, b, " > ", op.match_case)
            }
            ComparisonKind::GreaterThanOrEqual { a, b } => {
                self.translate_ordering(a, b, " >= ", op.match_case)
            }
            ComparisonKind::Like {
                prop,
                pattern,
                wildcard,
                single_char,
                escape_char,
            } => self.translate_like(
                prop,
                pattern,
                *wildcard,
                *single_char,
                *escape_char,
                op.match_case,
                false,
            ),
            ComparisonKind::IsNull { prop } => {
                let fragment = self.translate_expr(prop)?;
                let mut builder = OperationBuilder::boolean();
                builder.expr(fragment).sql(" IS NULL");
                Ok(builder.build())
            }
            ComparisonKind::IsNil { prop } => {
                let Expr::Property(name) = prop else {
                    return Err(TranslateError::invalid(
                        "IsNil is only supported for property references",
                    ));
                };
                let rewritten = (self.options.nil_rewrite)(name);
                let fragment = self.translate_property(&rewritten)?;
                let mut builder = OperationBuilder::boolean();
                builder.expr(fragment).sql(" IS NULL");
                Ok(builder.build())
            }
        }
    }

    /// Equality and inequality. Single-valued operands compare directly; a
    /// concatenated column against a literal is rewritten as a
    /// delimiter-anchored LIKE test.
    fn translate_equality(
        &mut self,
        a: &Expr,
        b: &Expr,
        match_case: bool,
        negated: bool,
    ) -> Result<SqlFragment> {
        let mut lhs = self.translate_expr(a)?;
        let mut rhs = self.translate_expr(b)?;
        if !lhs.is_multi_valued() && !rhs.is_multi_valued() {
            infer_type(&mut lhs, &mut rhs);
            let mut builder = OperationBuilder::boolean();
            self.add_expression(&mut builder, lhs, match_case);
            builder.sql(if negated { " <> " } else { " = " });
            self.add_expression(&mut builder, rhs, match_case);
            return Ok(builder.build());
        }

        // Multi-valued storage: only "property equals literal" has a sound
        // SQL rendering (an anchored LIKE against the concatenated form).
        let (Expr::Property(_), Expr::Literal(value)) = (a, b) else {
            return Err(TranslateError::unmappable(
                "multi-valued columns can only be compared to literals",
            ));
        };
        let literal = value
            .as_string()
            .ok_or_else(|| TranslateError::unmappable("cannot escape non-textual literal"))?;
        let escaped = like::escape_literal(&literal, WILDCARD, SINGLE_CHAR, ESCAPE_CHAR);
        let pattern = Expr::Literal(Value::String(escaped));
        let like = self.translate_like(
            a,
            &pattern,
            WILDCARD,
            SINGLE_CHAR,
            ESCAPE_CHAR,
            match_case,
            negated,
        )?;
        Ok(like)
    }

    fn translate_ordering(
        &mut self,
        a: &Expr,
        b: &Expr,
        operator: &str,
        match_case: bool,
    ) -> Result<SqlFragment> {
        let mut lhs = self.translate_expr_single(a)?;
        let mut rhs = self.translate_expr_single(b)?;
        infer_type(&mut lhs, &mut rhs);
        let mut builder = OperationBuilder::boolean();
        self.add_expression(&mut builder, lhs, match_case);
        builder.sql(operator);
        self.add_expression(&mut builder, rhs, match_case);
        Ok(builder.build())
    }

    #[allow(clippy::too_many_arguments)]
    fn translate_like(
        &mut self,
        prop: &Expr,
        pattern: &Expr,
        wildcard: char,
        single_char: char,
        escape_char: char,
        match_case: bool,
        negated: bool,
    ) -> Result<SqlFragment> {
        let Expr::Literal(pattern_value) = pattern else {
            return Err(TranslateError::unmappable(
                "LIKE with a non-literal pattern cannot be mapped to SQL",
            ));
        };
        let pattern_text = pattern_value
            .as_string()
            .ok_or_else(|| TranslateError::unmappable("LIKE pattern is not textual"))?;

        let fragment = self.translate_expr(prop)?;
        let parsed = LikePattern::parse(&pattern_text, wildcard, single_char, escape_char);
        let mut encoded = parsed.to_sql(!match_case, self.dialect.like_escape_char());
        let multi_valued = fragment.is_multi_valued();
        if multi_valued {
            encoded = like::wrap_concatenated(&encoded);
        }

        let mut builder = OperationBuilder::boolean();
        if negated {
            builder.sql("NOT (");
        }
        self.add_expression(&mut builder, fragment, match_case);
        builder.sql(" LIKE ");
        let converter = DefaultConverter::typed(BaseType::String)
            .concatenated(multi_valued)
            .shared();
        builder.expr(SqlFragment::Argument(SqlArgument::with_converter(
            Value::String(encoded),
            converter,
        )));
        if negated {
            builder.sql(")");
        }
        Ok(builder.build())
    }

    fn translate_spatial(&mut self, op: &SpatialOp) -> Result<SqlFragment> {
        let fragment = self.translate_property_spatial(op.prop())?;
        if !fragment.is_spatial() {
            return Err(TranslateError::invalid(format!(
                "cannot evaluate spatial operator on database: property '{}' does not \
                 denote a spatial column",
                op.prop()
            )));
        }
        self.dialect.spatial_predicate(op, fragment)
    }

    fn translate_sort(&mut self, sort: &[SortKey]) -> Result<SqlFragment> {
        let mut builder = OperationBuilder::new();
        for (i, key) in sort.iter().enumerate() {
            if i > 0 {
                builder.sql(",");
            }
            builder.expr(self.translate_property(&key.property)?);
            builder.sql(if key.ascending { " ASC" } else { " DESC" });
        }
        Ok(builder.build())
    }

    fn translate_expr(&mut self, expr: &Expr) -> Result<SqlFragment> {
        match expr {
            Expr::Literal(value) => translate_literal(value),
            Expr::Property(name) => self.translate_property(name),
            Expr::Add(a, b) => self.translate_arithmetic(a, b, "+"),
            Expr::Sub(a, b) => self.translate_arithmetic(a, b, "-"),
            Expr::Mul(a, b) => self.translate_arithmetic(a, b, "*"),
            Expr::Div(a, b) => self.translate_arithmetic(a, b, "/"),
            Expr::Function { name, args } => self.translate_function(name, args),
        }
    }

    /// Translates `expr` and rejects fragments that refer to a concatenated
    /// column; arithmetic and ordering have no meaning over those.
    fn translate_expr_single(&mut self, expr: &Expr) -> Result<SqlFragment> {
        let fragment = self.translate_expr(expr)?;
        if fragment.is_multi_valued() {
            return Err(TranslateError::unmappable(
                "filter refers to a column that stores multiple values in concatenated form",
            ));
        }
        Ok(fragment)
    }

    fn translate_arithmetic(&mut self, a: &Expr, b: &Expr, operator: &str) -> Result<SqlFragment> {
        let lhs = self.translate_expr_single(a)?;
        let rhs = self.translate_expr_single(b)?;
        let mut builder = OperationBuilder::new();
        builder.sql("(").expr(lhs).sql(operator).expr(rhs).sql(")");
        Ok(builder.build())
    }

    /// Functions lower along two paths: a registered SQL function call is
    /// emitted directly; otherwise, if every argument is a constant, the
    /// function is evaluated right here and the result bound as a single
    /// argument. A non-constant function without SQL equivalent cannot be
    /// pushed down.
    fn translate_function(&mut self, name: &str, args: &[Expr]) -> Result<SqlFragment> {
        let mut params = Vec::with_capacity(args.len());
        for arg in args {
            params.push(self.translate_expr(arg)?);
        }
        let is_constant = params.iter().all(SqlFragment::is_argument);

        if let Some(lowering) = self.functions.sql_lowering(name) {
            return lowering(name, params);
        }
        if is_constant {
            let values: Vec<Value> = params
                .iter()
                .map(|param| match param {
                    SqlFragment::Argument(arg) => arg.value.clone(),
                    _ => unreachable!("is_constant checked above"),
                })
                .collect();
            let folded = self.functions.call(name, &values)?;
            return Ok(SqlFragment::Argument(SqlArgument::untyped(folded)));
        }
        warn!("unable to translate function '{name}' to an SQL function call");
        Err(TranslateError::unmappable(format!(
            "no SQL function implementation for function '{name}'"
        )))
    }

    fn translate_property(&mut self, prop: &PropertyName) -> Result<SqlFragment> {
        let mapping = self.resolver.resolve(prop, &mut self.aliases);
        self.fragment_from_mapping(prop, mapping)
    }

    fn translate_property_spatial(&mut self, prop: &PropertyName) -> Result<SqlFragment> {
        let mapping = self.resolver.resolve_spatial(prop, &mut self.aliases);
        self.fragment_from_mapping(prop, mapping)
    }

    fn fragment_from_mapping(
        &mut self,
        prop: &PropertyName,
        mapping: Option<PropertyMapping>,
    ) -> Result<SqlFragment> {
        match mapping {
            Some(PropertyMapping::Constant(value)) => {
                let ty = value.base_type().unwrap_or(BaseType::String);
                Ok(SqlFragment::Argument(SqlArgument::typed(value, ty)))
            }
            Some(PropertyMapping::Column(col)) => {
                self.mapped.push(MappedProperty {
                    property: prop.clone(),
                    table_alias: col.table_alias.clone(),
                    column: col.column.clone(),
                    joins: col.joins.clone(),
                });
                Ok(SqlFragment::Column(SqlColumn {
                    table_alias: col.table_alias,
                    column: col.column,
                    converter: col.converter,
                    spatial: col.spatial,
                    srid: col.srid,
                }))
            }
            None => Err(TranslateError::unmappable(format!(
                "unable to map property '{prop}' to a database column"
            ))),
        }
    }

    /// Appends `fragment`, wrapped in the dialect's case-normalizing
    /// function when the comparison is case-insensitive.
    fn add_expression(&self, builder: &mut OperationBuilder, fragment: SqlFragment, match_case: bool) {
        if match_case {
            builder.expr(fragment);
        } else {
            builder.sql(self.dialect.lower_function());
            builder.sql("(");
            builder.expr(fragment);
            builder.sql(")");
        }
    }
}

fn translate_literal(value: &Value) -> Result<SqlFragment> {
    if value.is_null() {
        // An explicit NULL argument, typed with the default converter.
        return Ok(SqlFragment::Argument(SqlArgument::typed(
            Value::Null,
            BaseType::String,
        )));
    }
    if !value.is_primitive() {
        return Err(TranslateError::unmappable(
            "only primitive-valued literals are supported",
        ));
    }
    // No type information yet; literal types are inferred per comparison.
    Ok(SqlFragment::Argument(SqlArgument::untyped(value.clone())))
}

fn infer_type(a: &mut SqlFragment, b: &mut SqlFragment) {
    match (a.base_type(), b.base_type()) {
        (None, Some(_)) => a.cast_from(b),
        (Some(_), None) => b.cast_from(a),
        (Some(ta), Some(tb)) if ta != tb => {
            warn!("comparison on different types ({ta:?}/{tb:?}), relying on db type conversion");
        }
        _ => {}
    }
}

fn infer_type3(a: &mut SqlFragment, b: &mut SqlFragment, c: &mut SqlFragment) {
    if a.base_type().is_some() {
        infer_type(a, b);
        infer_type(a, c);
    } else if b.base_type().is_some() {
        infer_type(b, a);
        infer_type(b, c);
    } else if c.base_type().is_some() {
        infer_type(c, a);
        infer_type(c, b);
    }
}
