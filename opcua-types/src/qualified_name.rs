// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0

//! `QualifiedName`: a browse name scoped to a namespace.

use crate::{binary_struct, string::UAString, UaNullable};

/// A name scoped to a namespace, e.g. a node's BrowseName.
#[derive(Eq, PartialEq, Debug, Clone, Hash, Default)]
pub struct QualifiedName {
    /// Namespace index the name is scoped to.
    pub namespace_index: u16,
    /// The name itself.
    pub name: UAString,
}

impl UaNullable for QualifiedName {
    fn is_ua_null(&self) -> bool {
        self.namespace_index == 0 && self.name.is_null()
    }
}

impl QualifiedName {
    /// Build a qualified name in the given namespace.
    pub fn new(namespace_index: u16, name: impl Into<UAString>) -> Self {
        Self {
            namespace_index,
            name: name.into(),
        }
    }
}

impl From<&str> for QualifiedName {
    fn from(value: &str) -> Self {
        QualifiedName::new(0, value)
    }
}

binary_struct!(QualifiedName {
    namespace_index: u16,
    name: UAString,
});
