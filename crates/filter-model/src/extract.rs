//! Pure helpers over the filter tree: nesting-depth measurement (used to
//! bound recursion before translation) and extraction of a bounding-box
//! pre-filter constraint.

use crate::operator::{ComparisonKind, Filter, LogicalOp};
use crate::spatial::SpatialOp;

impl Filter {
    /// Nesting depth of this filter tree, counting both operator and
    /// expression nesting.
    pub fn depth(&self) -> usize {
        match self {
            Filter::Comparison(op) => {
                let operands = match &op.kind {
                    ComparisonKind::Between { expr, lower, upper } => {
                        vec![expr, lower, upper]
                    }
                    ComparisonKind::Equal { a, b }
                    | ComparisonKind::NotEqual { a, b }
                    | ComparisonKind::LessThan { a, b }
                    | ComparisonKind::LessThanOrEqual { a, b }
                    | ComparisonKind::GreaterThan { a, b }
                    | ComparisonKind::GreaterThanOrEqual { a, b } => vec![a, b],
                    ComparisonKind::Like { prop, pattern, .. } => vec![prop, pattern],
                    ComparisonKind::IsNull { prop } | ComparisonKind::IsNil { prop } => {
                        vec![prop]
                    }
                };
                1 + operands.iter().map(|e| e.depth()).max().unwrap_or(0)
            }
            Filter::Logical(op) => {
                let children: &[Filter] = match op {
                    LogicalOp::And(children) | LogicalOp::Or(children) => children,
                    LogicalOp::Not(child) => std::slice::from_ref(child),
                };
                1 + children.iter().map(Filter::depth).max().unwrap_or(0)
            }
            Filter::Spatial(_) | Filter::Temporal(_) => 1,
        }
    }
}

/// Extracts a bounding-box constraint usable for pre-filtering, if the filter
/// contains one anywhere in its tree.
///
/// All bbox constraints found are merged by envelope union when they target
/// the same property; otherwise the first one found wins. The union keeps the
/// pre-filter a sound over-approximation: in degraded mode the caller always
/// re-applies the full original filter in memory, so the bbox only has to
/// never exclude a matching row.
pub fn extract_prefilter_bbox(filter: &Filter) -> Option<SpatialOp> {
    let mut found: Vec<&SpatialOp> = Vec::new();
    collect_bboxes(filter, &mut found);

    let (first, rest) = found.split_first()?;
    let (prop, mut envelope) = match first {
        SpatialOp::Bbox { prop, envelope } => (prop.clone(), *envelope),
        _ => unreachable!("collect_bboxes only collects Bbox"),
    };
    for op in rest {
        if let SpatialOp::Bbox {
            prop: other_prop,
            envelope: other,
        } = op
            && *other_prop == prop
        {
            envelope = envelope.union(other);
        }
    }
    Some(SpatialOp::Bbox { prop, envelope })
}

fn collect_bboxes<'a>(filter: &'a Filter, out: &mut Vec<&'a SpatialOp>) {
    match filter {
        Filter::Spatial(op @ SpatialOp::Bbox { .. }) => out.push(op),
        Filter::Spatial(_) | Filter::Comparison(_) | Filter::Temporal(_) => {}
        Filter::Logical(LogicalOp::And(children)) | Filter::Logical(LogicalOp::Or(children)) => {
            for child in children {
                collect_bboxes(child, out);
            }
        }
        Filter::Logical(LogicalOp::Not(child)) => collect_bboxes(child, out),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::Expr;
    use crate::operator::ComparisonKind;
    use crate::path::PropertyName;
    use crate::spatial::Envelope;
    use crate::value::Value;

    fn bbox(path: &str, env: Envelope) -> Filter {
        Filter::Spatial(SpatialOp::Bbox {
            prop: PropertyName::new(path),
            envelope: env,
        })
    }

    fn name_eq(val: &str) -> Filter {
        Filter::comparison(ComparisonKind::Equal {
            a: Expr::property("name"),
            b: Expr::literal(Value::String(val.into())),
        })
    }

    #[test]
    fn finds_bbox_nested_under_logical_operators() {
        let filter = Filter::and(vec![
            name_eq("x"),
            Filter::not(Filter::or(vec![
                name_eq("y"),
                bbox("geom", Envelope::new(0.0, 0.0, 1.0, 1.0)),
            ])),
        ]);
        let found = extract_prefilter_bbox(&filter).unwrap();
        match found {
            SpatialOp::Bbox { prop, .. } => assert_eq!(prop.path, "geom"),
            _ => panic!("expected bbox"),
        }
    }

    #[test]
    fn merges_envelopes_for_same_property() {
        let filter = Filter::or(vec![
            bbox("geom", Envelope::new(0.0, 0.0, 1.0, 1.0)),
            bbox("geom", Envelope::new(2.0, 2.0, 3.0, 3.0)),
        ]);
        match extract_prefilter_bbox(&filter).unwrap() {
            SpatialOp::Bbox { envelope, .. } => {
                assert_eq!(envelope.min_x, 0.0);
                assert_eq!(envelope.max_x, 3.0);
            }
            _ => panic!("expected bbox"),
        }
    }

    #[test]
    fn none_without_bbox() {
        assert!(extract_prefilter_bbox(&name_eq("x")).is_none());
    }

    #[test]
    fn depth_counts_nesting() {
        let filter = Filter::and(vec![Filter::not(name_eq("x"))]);
        assert_eq!(filter.depth(), 4); // and -> not -> comparison -> expr
    }
}
