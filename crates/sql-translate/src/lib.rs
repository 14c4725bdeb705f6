//! Translation of database-agnostic filter expressions into parameterized
//! SQL WHERE/ORDER BY fragments, with precise reporting of the parts that
//! must instead be applied in memory against the fetched rows.

pub mod alias;
pub mod builder;
pub mod convert;
pub mod dialect;
pub mod error;
pub mod fragment;
pub mod functions;
pub mod like;
pub mod mapping;

pub use alias::TableAliasManager;
pub use builder::{
    MappingState, NilRewrite, TranslateOptions, Translation, WhereBuilder, xsi_nil_rewrite,
};
pub use convert::{DefaultConverter, ValueConverter};
pub use dialect::{Ansi, Dialect, MySql, Postgres};
pub use error::{Result, TranslateError};
pub use fragment::{
    OperationBuilder, OperationPart, Render, Renderer, SqlArgument, SqlColumn, SqlFragment,
    SqlOperation,
};
pub use functions::FunctionRegistry;
pub use like::LikePattern;
pub use mapping::{
    ColumnDef, ColumnMapping, Join, JoinStep, MappedProperty, PropertyMapping, PropertyResolver,
    StaticResolver,
};
