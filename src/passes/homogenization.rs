//! Reshapes subtrees so their structure matches the possible values of one
//! or more enumerations.
//!
//! A node whose metadata declares `breakdown: [dim0, dim1, ...]` must have
//! exactly one child per label of `dim0`, recursively re-broken-down by the
//! remaining dimensions. The pass adds what is missing and never deletes:
//! a leaf tagged with a breakdown is promoted to an internal node, absent
//! labels get fresh default leaves, and children outside the label set are
//! kept and reported.
//!
//! Children are keyed by the enumeration's symbolic label exactly as the
//! `EnumSource` supplies it.

use crate::temporal::Instant;
use crate::tree::{Node, Parameter, ParameterNode};
use std::collections::BTreeMap;
use tracing::warn;

/// The instant given to synthesized default leaves, far enough in the past
/// to cover any realistic query.
const DEFAULT_ENTRY_EPOCH: Instant = Instant::from_parts_unchecked(2000, 1, 1);

/// Supplies the ordered labels of a named enumeration, typically derived
/// from the host system's enumerated variable types.
pub trait EnumSource {
    fn labels(&self, name: &str) -> Option<&[String]>;
}

impl EnumSource for BTreeMap<String, Vec<String>> {
    fn labels(&self, name: &str) -> Option<&[String]> {
        self.get(name).map(Vec::as_slice)
    }
}

pub fn homogenize(root: &mut ParameterNode, enums: &impl EnumSource, default_value: f64) {
    // Treat the root like any other internal node so a breakdown on the
    // root itself is honored.
    let mut slot = Node::Internal(std::mem::take(root));
    visit(&mut slot, enums, default_value);
    match slot {
        Node::Internal(node) => *root = node,
        _ => unreachable!("reshape never replaces an internal node"),
    }
}

fn visit(slot: &mut Node, enums: &impl EnumSource, default_value: f64) {
    if let Some(dims) = slot.metadata().breakdown.clone() {
        reshape(slot, &dims, enums, default_value);
    }
    match slot {
        Node::Leaf(_) => {}
        Node::Internal(internal) => {
            for child in internal.children.values_mut() {
                visit(child, enums, default_value);
            }
        }
        Node::Scale(scale) => {
            for bracket in &mut scale.brackets {
                visit(bracket, enums, default_value);
            }
        }
    }
}

fn reshape(slot: &mut Node, dims: &[String], enums: &impl EnumSource, default_value: f64) {
    let Some((dim, rest)) = dims.split_first() else {
        return;
    };
    let Some(labels) = enums.labels(dim) else {
        warn!(
            node = slot.name(),
            enumeration = %dim,
            "unknown enumeration in breakdown, node left unchanged"
        );
        return;
    };

    // A leaf with a breakdown becomes an internal node; its entries are
    // superseded by the per-label defaults.
    if let Node::Leaf(leaf) = &mut *slot {
        let replacement = ParameterNode {
            name: leaf.name.clone(),
            children: BTreeMap::new(),
            metadata: std::mem::take(&mut leaf.metadata),
        };
        *slot = Node::Internal(replacement);
    }
    let Node::Internal(node) = slot else {
        // Scales keep their bracket shape.
        return;
    };

    for label in labels {
        if !node.children.contains_key(label) {
            let child_name = if node.name.is_empty() {
                label.clone()
            } else {
                format!("{}.{}", node.name, label)
            };
            node.children.insert(
                label.clone(),
                Node::Leaf(Parameter::with_single_entry(
                    child_name,
                    DEFAULT_ENTRY_EPOCH,
                    default_value,
                )),
            );
        }
    }

    for name in node.children.keys() {
        if labels.iter().any(|label| label == name) || reinterprets_as_label(name, labels) {
            continue;
        }
        warn!(
            node = %node.name,
            child = %name,
            enumeration = %dim,
            "child is not a possible value of the enumeration, keeping it"
        );
    }

    if !rest.is_empty() {
        for child in node.children.values_mut() {
            reshape(child, rest, enums, default_value);
        }
    }
}

/// A child name that is merely a different numeric spelling of an expected
/// label is not worth a diagnostic.
fn reinterprets_as_label(name: &str, labels: &[String]) -> bool {
    name.parse::<i64>()
        .map(|n| labels.iter().any(|label| *label == n.to_string()))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::resolve;
    use crate::tree::{Metadata, ValueEntry};
    use serde_json::json;

    fn at(s: &str) -> Instant {
        s.parse().unwrap()
    }

    fn enums() -> BTreeMap<String, Vec<String>> {
        let mut map = BTreeMap::new();
        map.insert(
            "country".to_string(),
            vec![
                "ENGLAND".to_string(),
                "SCOTLAND".to_string(),
                "WALES".to_string(),
                "NORTHERN_IRELAND".to_string(),
            ],
        );
        map.insert(
            "region".to_string(),
            vec![
                "NORTH_EAST".to_string(),
                "LONDON".to_string(),
                "SCOTLAND".to_string(),
            ],
        );
        map
    }

    fn leaf(name: &str, entries: &[(&str, f64)]) -> Node {
        Node::Leaf(Parameter::new(
            name,
            entries
                .iter()
                .map(|&(s, v)| ValueEntry {
                    instant: at(s),
                    value: v,
                })
                .collect(),
            Metadata::default(),
        ))
    }

    fn breakdown_node(name: &str, breakdown: serde_json::Value) -> ParameterNode {
        let mut node = ParameterNode::new(name);
        node.metadata = Metadata::from_value(name, &json!({"breakdown": breakdown})).unwrap();
        node
    }

    fn value_at(root: &ParameterNode, path: &str, date: &str) -> Option<f64> {
        resolve(root, path).unwrap().as_leaf().unwrap().value_at(at(date))
    }

    #[test]
    fn test_single_dimension_fills_missing_labels() {
        let mut by_country = breakdown_node("by_country", json!(["country"]));
        by_country.children.insert(
            "ENGLAND".to_string(),
            leaf("by_country.ENGLAND", &[("2021-01-01", 1.0)]),
        );
        let mut root = ParameterNode::new("root");
        root.children
            .insert("by_country".to_string(), Node::Internal(by_country));

        homogenize(&mut root, &enums(), 0.0);

        let node = match resolve(&root, "by_country").unwrap() {
            Node::Internal(n) => n,
            other => panic!("expected internal node, got {:?}", other),
        };
        assert_eq!(node.children.len(), 4);

        // Explicit child keeps its value; synthesized ones default at any
        // query instant.
        assert_eq!(value_at(&root, "by_country.ENGLAND", "2021-01-01"), Some(1.0));
        assert_eq!(value_at(&root, "by_country.SCOTLAND", "2021-01-01"), Some(0.0));
        assert_eq!(value_at(&root, "by_country.WALES", "2005-06-01"), Some(0.0));
        assert_eq!(
            value_at(&root, "by_country.NORTHERN_IRELAND", "2021-01-01"),
            Some(0.0)
        );
    }

    #[test]
    fn test_leaf_with_breakdown_is_promoted_to_internal() {
        let mut root = ParameterNode::new("root");
        let tagged = Parameter::new(
            "by_country",
            vec![ValueEntry {
                instant: at("2021-01-01"),
                value: 7.0,
            }],
            Metadata::from_value("by_country", &json!({"breakdown": "country"})).unwrap(),
        );
        root.children
            .insert("by_country".to_string(), Node::Leaf(tagged));

        homogenize(&mut root, &enums(), 0.5);

        assert!(matches!(
            resolve(&root, "by_country").unwrap(),
            Node::Internal(_)
        ));
        assert_eq!(value_at(&root, "by_country.ENGLAND", "2021-01-01"), Some(0.5));
        assert_eq!(value_at(&root, "by_country.WALES", "2021-01-01"), Some(0.5));
    }

    #[test]
    fn test_two_dimensions_recurse_per_label() {
        let mut by_country = breakdown_node("x", json!(["country", "region"]));
        let mut england = ParameterNode::new("x.ENGLAND");
        england.children.insert(
            "NORTH_EAST".to_string(),
            leaf("x.ENGLAND.NORTH_EAST", &[("2021-01-01", 1.0)]),
        );
        by_country
            .children
            .insert("ENGLAND".to_string(), Node::Internal(england));
        let mut root = ParameterNode::new("root");
        root.children
            .insert("x".to_string(), Node::Internal(by_country));

        homogenize(&mut root, &enums(), 0.0);

        // Every country subtree carries the full region set.
        for country in ["ENGLAND", "SCOTLAND", "WALES", "NORTHERN_IRELAND"] {
            for region in ["NORTH_EAST", "LONDON", "SCOTLAND"] {
                let path = format!("x.{}.{}", country, region);
                let expected = if country == "ENGLAND" && region == "NORTH_EAST" {
                    1.0
                } else {
                    0.0
                };
                assert_eq!(
                    value_at(&root, &path, "2021-01-01"),
                    Some(expected),
                    "at {}",
                    path
                );
            }
        }
    }

    #[test]
    fn test_unexpected_child_is_kept() {
        let mut by_country = breakdown_node("by_country", json!(["country"]));
        by_country.children.insert(
            "OTHER".to_string(),
            leaf("by_country.OTHER", &[("2021-01-01", 9.0)]),
        );
        let mut root = ParameterNode::new("root");
        root.children
            .insert("by_country".to_string(), Node::Internal(by_country));

        homogenize(&mut root, &enums(), 0.0);

        // 4 expected labels plus the retained stranger.
        let node = match resolve(&root, "by_country").unwrap() {
            Node::Internal(n) => n,
            _ => panic!("expected internal node"),
        };
        assert_eq!(node.children.len(), 5);
        assert_eq!(value_at(&root, "by_country.OTHER", "2021-01-01"), Some(9.0));
    }

    #[test]
    fn test_numeric_child_matching_a_label_is_not_duplicated() {
        let mut map = BTreeMap::new();
        map.insert(
            "band".to_string(),
            vec!["1".to_string(), "2".to_string(), "3".to_string()],
        );

        let mut by_band = breakdown_node("by_band", json!(["band"]));
        by_band
            .children
            .insert("2".to_string(), leaf("by_band.2", &[("2021-01-01", 4.0)]));
        let mut root = ParameterNode::new("root");
        root.children
            .insert("by_band".to_string(), Node::Internal(by_band));

        homogenize(&mut root, &map, 0.0);

        let node = match resolve(&root, "by_band").unwrap() {
            Node::Internal(n) => n,
            _ => panic!("expected internal node"),
        };
        assert_eq!(node.children.len(), 3);
        assert_eq!(value_at(&root, "by_band.2", "2021-01-01"), Some(4.0));
    }

    #[test]
    fn test_unknown_enumeration_leaves_node_unchanged() {
        let mut tagged = breakdown_node("x", json!(["nonexistent"]));
        tagged
            .children
            .insert("A".to_string(), leaf("x.A", &[("2021-01-01", 1.0)]));
        let mut root = ParameterNode::new("root");
        root.children.insert("x".to_string(), Node::Internal(tagged));

        homogenize(&mut root, &enums(), 0.0);

        let node = match resolve(&root, "x").unwrap() {
            Node::Internal(n) => n,
            _ => panic!("expected internal node"),
        };
        assert_eq!(node.children.len(), 1);
    }

    #[test]
    fn test_breakdown_on_the_root_itself() {
        let mut root = breakdown_node("", json!(["country"]));
        root.children
            .insert("ENGLAND".to_string(), leaf("ENGLAND", &[("2021-01-01", 1.0)]));

        homogenize(&mut root, &enums(), 0.0);

        assert_eq!(root.children.len(), 4);
        assert_eq!(value_at(&root, "SCOTLAND", "2021-01-01"), Some(0.0));
    }
}
