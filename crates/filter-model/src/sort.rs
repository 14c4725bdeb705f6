use crate::path::PropertyName;
use serde::{Deserialize, Serialize};

/// One key of an ORDER BY request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SortKey {
    pub property: PropertyName,
    pub ascending: bool,
}

impl SortKey {
    pub fn asc(path: impl Into<String>) -> SortKey {
        SortKey {
            property: PropertyName::new(path),
            ascending: true,
        }
    }

    pub fn desc(path: impl Into<String>) -> SortKey {
        SortKey {
            property: PropertyName::new(path),
            ascending: false,
        }
    }
}
