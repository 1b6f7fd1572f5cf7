//! Conversion between nested value trees and flat dot-path maps.
//!
//! # Collisions
//! A key that is a strict prefix of another (`a` and `a.b`) cannot be
//! represented as a tree. `unflatten` walks keys in sorted order, so the
//! prefix is always seen first and the nested entries replace it. The
//! replaced value is logged.

use std::collections::BTreeMap;

/// Separator between path segments.
pub const SEPARATOR: char = '.';

/// A nested configuration value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueTree {
    Leaf(String),
    Node(BTreeMap<String, ValueTree>),
}

impl ValueTree {
    pub fn empty_node() -> Self {
        ValueTree::Node(BTreeMap::new())
    }
}

impl Default for ValueTree {
    fn default() -> Self {
        Self::empty_node()
    }
}

/// Flatten a tree into `a.b.c -> value` entries.
pub fn flatten(tree: &ValueTree) -> BTreeMap<String, String> {
    let mut flat = BTreeMap::new();
    flatten_into(tree, String::new(), &mut flat);
    flat
}

fn flatten_into(tree: &ValueTree, prefix: String, out: &mut BTreeMap<String, String>) {
    match tree {
        ValueTree::Leaf(value) => {
            out.insert(prefix, value.clone());
        }
        ValueTree::Node(children) => {
            for (name, child) in children {
                let path = if prefix.is_empty() {
                    name.clone()
                } else {
                    format!("{prefix}{SEPARATOR}{name}")
                };
                flatten_into(child, path, out);
            }
        }
    }
}

/// Rebuild a tree from dot-path entries.
pub fn unflatten(flat: &BTreeMap<String, String>) -> ValueTree {
    let mut root = BTreeMap::new();
    for (path, value) in flat {
        insert_path(&mut root, path, value);
    }
    ValueTree::Node(root)
}

fn insert_path(root: &mut BTreeMap<String, ValueTree>, path: &str, value: &str) {
    let segments: Vec<&str> = path.split(SEPARATOR).collect();
    let Some((last, parents)) = segments.split_last() else {
        return;
    };

    let mut current = root;
    for (depth, segment) in parents.iter().enumerate() {
        let slot = current
            .entry((*segment).to_string())
            .or_insert_with(ValueTree::empty_node);
        if let ValueTree::Leaf(previous) = slot {
            tracing::warn!(
                key = %segments[..=depth].join("."),
                replaced_by = %path,
                value = %previous,
                "Leaf shadowed by nested key, dropping leaf"
            );
            *slot = ValueTree::empty_node();
        }
        current = match slot {
            ValueTree::Node(children) => children,
            ValueTree::Leaf(_) => unreachable!("slot was just replaced by a node"),
        };
    }

    let previous = current.insert((*last).to_string(), ValueTree::Leaf(value.to_string()));
    if let Some(ValueTree::Node(children)) = previous {
        tracing::warn!(
            key = %path,
            dropped = children.len(),
            "Nested keys shadowed by leaf, dropping subtree"
        );
    }
}
