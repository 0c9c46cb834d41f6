use crate::temporal::Instant;
use crate::tree::metadata::Metadata;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One point of a leaf's temporal value series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValueEntry {
    pub instant: Instant,
    pub value: f64,
}

/// A leaf node: a scalar value series indexed by calendar time.
///
/// `values` is kept sorted by instant descending with no duplicate instants.
/// `name` is the full dotted path of the leaf, carried for diagnostics.
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub name: String,
    pub values: Vec<ValueEntry>,
    pub metadata: Metadata,
}

impl Parameter {
    pub fn new(name: impl Into<String>, entries: Vec<ValueEntry>, metadata: Metadata) -> Self {
        let mut parameter = Self {
            name: name.into(),
            values: entries,
            metadata,
        };
        parameter.normalize();
        parameter
    }

    /// A leaf with a single entry, used when homogenization synthesizes
    /// missing children.
    pub fn with_single_entry(name: impl Into<String>, instant: Instant, value: f64) -> Self {
        Self {
            name: name.into(),
            values: vec![ValueEntry { instant, value }],
            metadata: Metadata::default(),
        }
    }

    /// The value of the latest entry at or before `instant`, if any.
    pub fn value_at(&self, instant: Instant) -> Option<f64> {
        self.values
            .iter()
            .find(|entry| entry.instant <= instant)
            .map(|entry| entry.value)
    }

    /// The latest explicit entry.
    pub fn latest(&self) -> Option<&ValueEntry> {
        self.values.first()
    }

    /// Restores the series invariant: sorted descending, duplicate-free.
    ///
    /// The sort is stable and deduplication keeps the first occurrence, so
    /// entries already present win over entries appended later at the same
    /// instant.
    pub fn normalize(&mut self) {
        self.values
            .sort_by_key(|entry| std::cmp::Reverse(entry.instant));
        self.values.dedup_by(|a, b| a.instant == b.instant);
    }
}

/// An internal node: named children plus its own metadata.
///
/// Children live in an ordered map so every traversal (and therefore every
/// pipeline output) is deterministic for a given input tree.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParameterNode {
    pub name: String,
    pub children: BTreeMap<String, Node>,
    pub metadata: Metadata,
}

impl ParameterNode {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Depth-first walk over every leaf below this node, with the dotted
    /// path of each leaf relative to this node. Scale bracket leaves get
    /// bracket paths (`tax.brackets[0].rate`).
    pub fn for_each_leaf(&self, f: &mut impl FnMut(&str, &Parameter)) {
        for (name, child) in &self.children {
            walk_leaves(child, name, f);
        }
    }
}

fn walk_leaves(node: &Node, path: &str, f: &mut impl FnMut(&str, &Parameter)) {
    match node {
        Node::Leaf(parameter) => f(path, parameter),
        Node::Internal(internal) => {
            for (name, child) in &internal.children {
                walk_leaves(child, &format!("{}.{}", path, name), f);
            }
        }
        Node::Scale(scale) => {
            for (index, bracket) in scale.brackets.iter().enumerate() {
                walk_leaves(bracket, &format!("{}[{}]", path, index), f);
            }
        }
    }
}

/// A scale: an ordered sequence of bracket nodes, each holding components
/// such as `rate` and `threshold`. Brackets are internal nodes and behave
/// like any other internal node for every pass; only path resolution treats
/// them specially (`name[i]` segments).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParameterScale {
    pub name: String,
    pub brackets: Vec<Node>,
    pub metadata: Metadata,
}

/// A child slot in the tree.
///
/// Held by value in the parent's child map, so structural rewrites (a leaf
/// promoted to an internal node during homogenization) are an assignment
/// through `&mut Node`.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Leaf(Parameter),
    Internal(ParameterNode),
    Scale(ParameterScale),
}

impl Node {
    pub fn name(&self) -> &str {
        match self {
            Node::Leaf(p) => &p.name,
            Node::Internal(n) => &n.name,
            Node::Scale(s) => &s.name,
        }
    }

    pub fn metadata(&self) -> &Metadata {
        match self {
            Node::Leaf(p) => &p.metadata,
            Node::Internal(n) => &n.metadata,
            Node::Scale(s) => &s.metadata,
        }
    }

    pub fn metadata_mut(&mut self) -> &mut Metadata {
        match self {
            Node::Leaf(p) => &mut p.metadata,
            Node::Internal(n) => &mut n.metadata,
            Node::Scale(s) => &mut s.metadata,
        }
    }

    pub fn as_leaf(&self) -> Option<&Parameter> {
        match self {
            Node::Leaf(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_leaf_mut(&mut self) -> Option<&mut Parameter> {
        match self {
            Node::Leaf(p) => Some(p),
            _ => None,
        }
    }
}
