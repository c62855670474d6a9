// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0

//! Bidirectional namespace URI <-> index table, consulted when formatting or
//! parsing the string form of a [`crate::NodeId`] in JSON.

/// Maps namespace index to URI and back. Index 0 is always the standard
/// OPC UA namespace and is never stored explicitly.
#[derive(Debug, Clone)]
pub struct NamespaceMap {
    uris: Vec<String>,
}

const OPC_UA_NAMESPACE: &str = "http://opcfoundation.org/UA/";

impl Default for NamespaceMap {
    fn default() -> Self {
        Self::new()
    }
}

impl NamespaceMap {
    /// Create a namespace table containing only the standard namespace at index 0.
    pub fn new() -> Self {
        Self { uris: Vec::new() }
    }

    /// Look up the URI for a namespace index, if registered.
    pub fn get_uri(&self, index: u16) -> Option<&str> {
        if index == 0 {
            Some(OPC_UA_NAMESPACE)
        } else {
            self.uris.get(index as usize - 1).map(|s| s.as_str())
        }
    }

    /// Look up the index for a namespace URI, if registered.
    pub fn get_index(&self, uri: &str) -> Option<u16> {
        if uri == OPC_UA_NAMESPACE {
            return Some(0);
        }
        self.uris
            .iter()
            .position(|u| u == uri)
            .map(|p| (p + 1) as u16)
    }

    /// Register a namespace URI, returning its assigned index. Re-adding an
    /// existing URI returns its existing index.
    pub fn add(&mut self, uri: impl Into<String>) -> u16 {
        let uri = uri.into();
        if let Some(idx) = self.get_index(&uri) {
            return idx;
        }
        self.uris.push(uri);
        self.uris.len() as u16
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn namespace_zero_is_implicit() {
        let map = NamespaceMap::new();
        assert_eq!(map.get_uri(0), Some(OPC_UA_NAMESPACE));
        assert_eq!(map.get_index(OPC_UA_NAMESPACE), Some(0));
    }

    #[test]
    fn add_is_idempotent() {
        let mut map = NamespaceMap::new();
        let a = map.add("urn:test");
        let b = map.add("urn:test");
        assert_eq!(a, b);
    }
}
