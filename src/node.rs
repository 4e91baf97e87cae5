//! Persisted node records and child-index key layout.
//!
//! Every collection is stored as a flat ordered keyspace. A container is
//! addressed by a stable `NodeId`; its children live at keys of the form
//! `be64(parent id) || name bytes`, so a prefix scan of the parent id yields
//! the children in ascending byte order of name.

use crate::error::StoreError;
use serde::{Deserialize, Serialize};

/// NodeId: stable identifier of a container within a collection
pub type NodeId = u64;

/// The collection root container. Allocated ids start above it.
pub const ROOT: NodeId = 0;

/// Length of the parent-id prefix in a child-index key
pub const KEY_PREFIX_LEN: usize = 8;

/// Node kind tag, used for conflict reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Container,
    Leaf,
}

impl std::fmt::Display for NodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            NodeKind::Container => "container",
            NodeKind::Leaf => "leaf",
        })
    }
}

/// A child entry of a container: either a nested container or a leaf
/// holding opaque content bytes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum EntryRecord {
    Container { node: NodeId },
    Leaf { content: Vec<u8> },
}

impl EntryRecord {
    pub fn kind(&self) -> NodeKind {
        match self {
            EntryRecord::Container { .. } => NodeKind::Container,
            EntryRecord::Leaf { .. } => NodeKind::Leaf,
        }
    }

    pub fn encode(&self) -> Result<Vec<u8>, StoreError> {
        bincode::serialize(self).map_err(|e| {
            StoreError::IoError(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("Failed to encode entry record: {}", e),
            ))
        })
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, StoreError> {
        bincode::deserialize(bytes).map_err(|e| {
            StoreError::IoError(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("Failed to decode entry record: {}", e),
            ))
        })
    }
}

/// Build the child-index key for `name` under `parent`.
pub fn child_key(parent: NodeId, name: &str) -> Vec<u8> {
    let mut key = Vec::with_capacity(KEY_PREFIX_LEN + name.len());
    key.extend_from_slice(&parent.to_be_bytes());
    key.extend_from_slice(name.as_bytes());
    key
}

/// Extract the name bytes from a scanned child-index key.
pub fn child_name(key: &[u8]) -> &[u8] {
    &key[KEY_PREFIX_LEN..]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_decode_leaf() {
        let record = EntryRecord::Leaf {
            content: b"General Kenobi".to_vec(),
        };
        let decoded = EntryRecord::decode(&record.encode().unwrap()).unwrap();
        match decoded {
            EntryRecord::Leaf { content } => assert_eq!(content, b"General Kenobi"),
            _ => panic!("Wrong record kind"),
        }
    }

    #[test]
    fn test_encode_decode_container() {
        let record = EntryRecord::Container { node: 42 };
        let decoded = EntryRecord::decode(&record.encode().unwrap()).unwrap();
        match decoded {
            EntryRecord::Container { node } => assert_eq!(node, 42),
            _ => panic!("Wrong record kind"),
        }
    }

    #[test]
    fn test_decode_garbage_fails() {
        assert!(EntryRecord::decode(&[0xff, 0xff, 0xff]).is_err());
    }

    #[test]
    fn test_child_key_layout() {
        let key = child_key(7, "The Ring");
        assert_eq!(&key[..KEY_PREFIX_LEN], &7u64.to_be_bytes());
        assert_eq!(child_name(&key), b"The Ring");
    }

    #[test]
    fn test_sibling_keys_sort_by_name() {
        // Keys under the same parent must iterate in byte order of name.
        let mut keys = vec![
            child_key(3, "prequel"),
            child_key(3, "1"),
            child_key(3, "The Ring"),
            child_key(3, "a"),
        ];
        keys.sort();
        let names: Vec<&[u8]> = keys.iter().map(|k| child_name(k)).collect();
        assert_eq!(names, [b"1" as &[u8], b"The Ring", b"a", b"prequel"]);
    }

    #[test]
    fn test_keys_of_different_parents_do_not_interleave() {
        let low = child_key(1, "zzzz");
        let high = child_key(2, "aaaa");
        assert!(low < high);
    }
}
