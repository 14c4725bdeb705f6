pub mod expr;
pub mod extract;
pub mod operator;
pub mod path;
pub mod sort;
pub mod spatial;
pub mod temporal;
pub mod value;

pub use expr::Expr;
pub use extract::extract_prefilter_bbox;
pub use operator::{ComparisonKind, ComparisonOp, Filter, LogicalOp, MatchAction};
pub use path::{NamespaceBindings, PropertyName, XSI_NS};
pub use sort::SortKey;
pub use spatial::{Envelope, SpatialOp};
pub use temporal::{TemporalKind, TemporalOp};
pub use value::{BaseType, Value};
