use filter_model::{BaseType, Value};
use std::fmt;
use std::sync::Arc;

/// Converts a typed domain value into a bindable database argument and
/// describes the storage of the column it belongs to.
///
/// The one storage detail the translator itself cares about is
/// concatenation: a column whose converter reports `is_concatenated()`
/// stores several logical values in one delimited string, which restricts
/// the comparison strategies that are legal against it.
pub trait ValueConverter: fmt::Debug + Send + Sync {
    /// Base type of the column, if known. Used for comparison type inference.
    fn base_type(&self) -> Option<BaseType> {
        None
    }

    /// Whether the underlying storage concatenates several logical values
    /// into one column (`|`-delimited).
    fn is_concatenated(&self) -> bool {
        false
    }

    /// Converts a domain value into the value actually bound at the
    /// placeholder position.
    fn to_argument(&self, value: &Value) -> Value {
        value.clone()
    }
}

/// Identity conversion with optional type information.
#[derive(Debug, Clone, Default)]
pub struct DefaultConverter {
    ty: Option<BaseType>,
    concatenated: bool,
}

impl DefaultConverter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn typed(ty: BaseType) -> Self {
        DefaultConverter {
            ty: Some(ty),
            concatenated: false,
        }
    }

    pub fn concatenated(mut self, concatenated: bool) -> Self {
        self.concatenated = concatenated;
        self
    }

    pub fn shared(self) -> Arc<dyn ValueConverter> {
        Arc::new(self)
    }
}

impl ValueConverter for DefaultConverter {
    fn base_type(&self) -> Option<BaseType> {
        self.ty
    }

    fn is_concatenated(&self) -> bool {
        self.concatenated
    }
}
