//! Depth-first walk over an untyped registry tree.
//!
//! Registry extracts have no stable shape: the same field can sit at any depth,
//! inside objects or arrays. Every extraction routine finds what it needs by
//! walking all objects below a root and testing them with a predicate.

use serde_json::{Map, Value};

pub type Object = Map<String, Value>;

/// Iterator over every object reachable from a root, arrays expanded.
///
/// Arrays themselves are never yielded, only the objects inside them. Scalars
/// and nulls are skipped. Visit order is unspecified.
pub struct Objects<'a> {
    stack: Vec<&'a Value>,
}

impl<'a> Iterator for Objects<'a> {
    type Item = &'a Object;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(current) = self.stack.pop() {
            match current {
                Value::Array(items) => self.stack.extend(items.iter().rev()),
                Value::Object(map) => {
                    self.stack.extend(map.values().rev());
                    return Some(map);
                }
                _ => {}
            }
        }
        None
    }
}

pub fn objects(root: &Value) -> Objects<'_> {
    Objects { stack: vec![root] }
}

/// All objects under `root` matching `predicate`.
pub fn find_all<'a, P>(root: &'a Value, mut predicate: P) -> Vec<&'a Object>
where
    P: FnMut(&Object) -> bool,
{
    objects(root).filter(|obj| predicate(obj)).collect()
}

/// Whether any object under `root` matches; stops at the first hit.
pub fn any<P>(root: &Value, mut predicate: P) -> bool
where
    P: FnMut(&Object) -> bool,
{
    objects(root).any(|obj| predicate(obj))
}

/// Follows a fixed chain of object keys, `None` as soon as a link is missing.
pub fn path<'a>(root: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().try_fold(root, |node, key| node.get(key))
}
