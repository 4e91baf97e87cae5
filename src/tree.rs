//! Tree navigation and rendering over a collection keyspace.
//!
//! All functions here operate on a single collection's ordered keyspace and
//! never mutate it directly: write paths stage their changes into a
//! `sled::Batch` that the store applies as one atomic step.

use crate::error::StoreError;
use crate::node::{child_key, child_name, EntryRecord, NodeId, ROOT};

/// Look up the child entry named `name` under `parent`.
pub fn lookup(
    tree: &sled::Tree,
    parent: NodeId,
    name: &str,
) -> Result<Option<EntryRecord>, StoreError> {
    match tree.get(child_key(parent, name))? {
        Some(raw) => Ok(Some(EntryRecord::decode(&raw)?)),
        None => Ok(None),
    }
}

/// Resolve a segment sequence from the collection root.
///
/// Zero segments resolve to the root container itself. A missing name, or an
/// attempt to descend through a leaf, fails with `NotFound`.
pub fn resolve<S: AsRef<str>>(
    tree: &sled::Tree,
    segments: &[S],
) -> Result<EntryRecord, StoreError> {
    let mut current = EntryRecord::Container { node: ROOT };
    for segment in segments {
        let segment = segment.as_ref();
        let parent = match current {
            EntryRecord::Container { node } => node,
            EntryRecord::Leaf { .. } => {
                return Err(StoreError::NotFound(segment.to_string()));
            }
        };
        current = lookup(tree, parent, segment)?
            .ok_or_else(|| StoreError::NotFound(segment.to_string()))?;
    }
    Ok(current)
}

/// Walk all but the last segment from the root, descending through existing
/// containers and staging creation of missing ones into `batch`.
///
/// Returns the parent container id and the final segment name; the caller
/// writes the terminal entry there. An existing leaf in the middle of the
/// path fails with `NameConflict`.
pub fn resolve_for_write<'a, S: AsRef<str>>(
    db: &sled::Db,
    tree: &sled::Tree,
    batch: &mut sled::Batch,
    segments: &'a [S],
) -> Result<(NodeId, &'a str), StoreError> {
    let (last, parents) = match segments.split_last() {
        Some(split) => split,
        None => return Err(StoreError::InvalidPath(String::new())),
    };

    let mut node = ROOT;
    // Once a container has been staged, everything below it is new: skip
    // the engine lookup for the rest of the walk.
    let mut staged = false;
    for name in parents {
        let name = name.as_ref();
        if staged {
            node = stage_container(db, batch, node, name)?;
            continue;
        }
        match lookup(tree, node, name)? {
            Some(EntryRecord::Container { node: child }) => node = child,
            Some(entry @ EntryRecord::Leaf { .. }) => {
                return Err(StoreError::NameConflict {
                    name: name.to_string(),
                    kind: entry.kind(),
                });
            }
            None => {
                node = stage_container(db, batch, node, name)?;
                staged = true;
            }
        }
    }
    Ok((node, last.as_ref()))
}

/// Allocate an id for a new container and stage its entry under `parent`.
fn stage_container(
    db: &sled::Db,
    batch: &mut sled::Batch,
    parent: NodeId,
    name: &str,
) -> Result<NodeId, StoreError> {
    // Id 0 is reserved for the collection root.
    let node = db.generate_id()? + 1;
    let record = EntryRecord::Container { node };
    batch.insert(child_key(parent, name), record.encode()?);
    Ok(node)
}

/// Stage removal of the entry addressed by `segments` and, if it is a
/// container, of every descendant key.
pub fn collect_subtree<S: AsRef<str>>(
    tree: &sled::Tree,
    batch: &mut sled::Batch,
    segments: &[S],
) -> Result<(), StoreError> {
    let (last, parents) = match segments.split_last() {
        Some(split) => split,
        None => return Err(StoreError::InvalidPath(String::new())),
    };
    let last = last.as_ref();

    let parent = match resolve(tree, parents)? {
        EntryRecord::Container { node } => node,
        EntryRecord::Leaf { .. } => return Err(StoreError::NotFound(last.to_string())),
    };
    let entry = lookup(tree, parent, last)?
        .ok_or_else(|| StoreError::NotFound(last.to_string()))?;

    batch.remove(child_key(parent, last));
    if let EntryRecord::Container { node } = entry {
        collect_children(tree, batch, node)?;
    }
    Ok(())
}

fn collect_children(
    tree: &sled::Tree,
    batch: &mut sled::Batch,
    node: NodeId,
) -> Result<(), StoreError> {
    for item in tree.scan_prefix(node.to_be_bytes()) {
        let (key, value) = item?;
        batch.remove(key);
        if let EntryRecord::Container { node: child } = EntryRecord::decode(&value)? {
            collect_children(tree, batch, child)?;
        }
    }
    Ok(())
}

/// Append the listing of `node`'s children to `out`, two spaces of
/// indentation per depth, names in ascending byte order, recursing into
/// sub-containers. Leaf content is never part of a listing.
pub fn render(
    tree: &sled::Tree,
    node: NodeId,
    depth: usize,
    out: &mut Vec<u8>,
) -> Result<(), StoreError> {
    for item in tree.scan_prefix(node.to_be_bytes()) {
        let (key, value) = item?;
        for _ in 0..depth {
            out.extend_from_slice(b"  ");
        }
        out.extend_from_slice(child_name(&key));
        out.push(b'\n');
        if let EntryRecord::Container { node: child } = EntryRecord::decode(&value)? {
            render(tree, child, depth + 1, out)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::NodeKind;
    use tempfile::TempDir;

    fn open_tree() -> (TempDir, sled::Db, sled::Tree) {
        let temp_dir = TempDir::new().unwrap();
        let db = sled::open(temp_dir.path()).unwrap();
        let tree = db.open_tree("test").unwrap();
        (temp_dir, db, tree)
    }

    fn put_leaf(db: &sled::Db, tree: &sled::Tree, path: &[&str], content: &[u8]) {
        let mut batch = sled::Batch::default();
        let (parent, name) = resolve_for_write(db, tree, &mut batch, path).unwrap();
        let record = EntryRecord::Leaf {
            content: content.to_vec(),
        };
        batch.insert(child_key(parent, name), record.encode().unwrap());
        tree.apply_batch(batch).unwrap();
    }

    #[test]
    fn test_resolve_empty_segments_returns_root() {
        let (_dir, _db, tree) = open_tree();
        let entry = resolve::<&str>(&tree, &[]).unwrap();
        assert!(matches!(entry, EntryRecord::Container { node: ROOT }));
    }

    #[test]
    fn test_resolve_missing_name_fails() {
        let (_dir, _db, tree) = open_tree();
        let result = resolve(&tree, &["missing"]);
        assert!(matches!(result, Err(StoreError::NotFound(_))));
    }

    #[test]
    fn test_write_resolution_creates_intermediate_containers() {
        let (_dir, db, tree) = open_tree();
        put_leaf(&db, &tree, &["a", "b", "c"], b"deep");

        match resolve(&tree, &["a", "b"]).unwrap() {
            EntryRecord::Container { .. } => {}
            _ => panic!("Intermediate segment should be a container"),
        }
        match resolve(&tree, &["a", "b", "c"]).unwrap() {
            EntryRecord::Leaf { content } => assert_eq!(content, b"deep"),
            _ => panic!("Terminal segment should be a leaf"),
        }
    }

    #[test]
    fn test_write_resolution_reuses_existing_containers() {
        let (_dir, db, tree) = open_tree();
        put_leaf(&db, &tree, &["dir", "one"], b"1");
        put_leaf(&db, &tree, &["dir", "two"], b"2");

        let dir = match resolve(&tree, &["dir"]).unwrap() {
            EntryRecord::Container { node } => node,
            _ => panic!("Expected container"),
        };
        assert!(lookup(&tree, dir, "one").unwrap().is_some());
        assert!(lookup(&tree, dir, "two").unwrap().is_some());
    }

    #[test]
    fn test_write_resolution_conflicts_on_mid_path_leaf() {
        let (_dir, db, tree) = open_tree();
        put_leaf(&db, &tree, &["file"], b"leaf");

        let mut batch = sled::Batch::default();
        let result = resolve_for_write(&db, &tree, &mut batch, &["file", "child"]);
        assert!(matches!(
            result,
            Err(StoreError::NameConflict {
                kind: NodeKind::Leaf,
                ..
            })
        ));
    }

    #[test]
    fn test_resolve_cannot_descend_through_leaf() {
        let (_dir, db, tree) = open_tree();
        put_leaf(&db, &tree, &["file"], b"leaf");

        let result = resolve(&tree, &["file", "below"]);
        assert!(matches!(result, Err(StoreError::NotFound(_))));
    }

    #[test]
    fn test_collect_subtree_removes_descendants() {
        let (_dir, db, tree) = open_tree();
        put_leaf(&db, &tree, &["a", "b", "c"], b"deep");
        put_leaf(&db, &tree, &["keep"], b"kept");

        let mut batch = sled::Batch::default();
        collect_subtree(&tree, &mut batch, &["a"]).unwrap();
        tree.apply_batch(batch).unwrap();

        assert!(matches!(
            resolve(&tree, &["a"]),
            Err(StoreError::NotFound(_))
        ));
        // Only the subtree under "a" is gone.
        assert!(matches!(
            resolve(&tree, &["keep"]).unwrap(),
            EntryRecord::Leaf { .. }
        ));
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn test_collect_subtree_missing_name_fails() {
        let (_dir, _db, tree) = open_tree();
        let mut batch = sled::Batch::default();
        let result = collect_subtree(&tree, &mut batch, &["missing"]);
        assert!(matches!(result, Err(StoreError::NotFound(_))));
    }

    #[test]
    fn test_render_orders_and_indents() {
        let (_dir, db, tree) = open_tree();
        put_leaf(&db, &tree, &["b", "inner"], b"x");
        put_leaf(&db, &tree, &["a"], b"y");

        let mut out = Vec::new();
        render(&tree, ROOT, 0, &mut out).unwrap();
        assert_eq!(out, b"a\nb\n  inner\n");
    }

    #[test]
    fn test_render_is_pure() {
        let (_dir, db, tree) = open_tree();
        put_leaf(&db, &tree, &["a", "b"], b"x");

        let mut first = Vec::new();
        render(&tree, ROOT, 0, &mut first).unwrap();
        let mut second = Vec::new();
        render(&tree, ROOT, 0, &mut second).unwrap();
        assert_eq!(first, second);
    }
}
