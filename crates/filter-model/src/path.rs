use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// The XML Schema instance namespace, used by the default IsNil rewrite.
pub const XSI_NS: &str = "http://www.w3.org/2001/XMLSchema-instance";

/// Prefix-to-URI bindings attached to a property path.
///
/// Uses a `BTreeMap` so that two paths with the same bindings compare (and
/// serialize) identically regardless of insertion order.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct NamespaceBindings {
    bindings: BTreeMap<String, String>,
}

impl NamespaceBindings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bind(&mut self, prefix: &str, uri: &str) {
        self.bindings.insert(prefix.to_string(), uri.to_string());
    }

    pub fn uri(&self, prefix: &str) -> Option<&str> {
        self.bindings.get(prefix).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

/// An abstract, hierarchical reference to a queryable attribute, independent
/// of how (or whether) it is stored relationally.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PropertyName {
    pub path: String,
    pub namespaces: NamespaceBindings,
}

impl PropertyName {
    pub fn new(path: impl Into<String>) -> Self {
        PropertyName {
            path: path.into(),
            namespaces: NamespaceBindings::new(),
        }
    }

    pub fn with_namespaces(path: impl Into<String>, namespaces: NamespaceBindings) -> Self {
        PropertyName {
            path: path.into(),
            namespaces,
        }
    }

    /// Returns a new path with `step` appended and `prefix` bound to `uri`.
    /// The receiver is not modified.
    pub fn appended(&self, step: &str, prefix: &str, uri: &str) -> PropertyName {
        let mut namespaces = self.namespaces.clone();
        namespaces.bind(prefix, uri);
        PropertyName {
            path: format!("{}{}", self.path, step),
            namespaces,
        }
    }
}

impl fmt::Display for PropertyName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn appended_leaves_original_untouched() {
        let prop = PropertyName::new("app:name");
        let rewritten = prop.appended("/@xsi:nil", "xsi", XSI_NS);
        assert_eq!(prop.path, "app:name");
        assert_eq!(rewritten.path, "app:name/@xsi:nil");
        assert_eq!(rewritten.namespaces.uri("xsi"), Some(XSI_NS));
        assert!(prop.namespaces.is_empty());
    }
}
