//! Resolves dotted paths like `tax.income.basic_rate` into tree nodes.
//!
//! A segment may carry one trailing bracket index (`tax.brackets[2].rate`),
//! which selects a bracket of a `ParameterScale` child. Both the uprating
//! pass and external reform application address parameters this way.

use crate::tree::{Node, ParameterNode};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PathError {
    #[error("could not find the parameter '{path}' (failed at '{segment}')")]
    NotFound { path: String, segment: String },
    #[error("invalid bracket syntax in '{path}' (should be e.g. tax.brackets[3].rate)")]
    InvalidSyntax { path: String },
}

fn not_found(path: &str, segment: &str) -> PathError {
    PathError::NotFound {
        path: path.to_string(),
        segment: segment.to_string(),
    }
}

/// Splits one path segment into a child name and an optional bracket index.
pub(crate) fn split_segment<'s>(
    path: &str,
    segment: &'s str,
) -> Result<(&'s str, Option<usize>), PathError> {
    let invalid = || PathError::InvalidSyntax {
        path: path.to_string(),
    };
    let Some(open) = segment.find('[') else {
        if segment.contains(']') {
            return Err(invalid());
        }
        return Ok((segment, None));
    };
    let name = &segment[..open];
    let rest = &segment[open + 1..];
    let close = rest.find(']').ok_or_else(invalid)?;
    if name.is_empty() || name.contains(']') || close != rest.len() - 1 {
        return Err(invalid());
    }
    let index = rest[..close].parse::<usize>().map_err(|_| invalid())?;
    Ok((name, Some(index)))
}

/// Resolves `path` to a node below `root`.
///
/// Fails with `PathError::NotFound` naming the first segment that could not
/// be resolved, or `PathError::InvalidSyntax` for malformed bracket
/// addresses.
pub fn resolve<'a>(root: &'a ParameterNode, path: &str) -> Result<&'a Node, PathError> {
    let mut current: Option<&Node> = None;
    for segment in path.split('.') {
        let (name, index) = split_segment(path, segment)?;
        let children = match current {
            None => &root.children,
            Some(Node::Internal(node)) => &node.children,
            Some(_) => return Err(not_found(path, segment)),
        };
        let mut child = children.get(name).ok_or_else(|| not_found(path, name))?;
        if let Some(index) = index {
            child = match child {
                Node::Scale(scale) => scale
                    .brackets
                    .get(index)
                    .ok_or_else(|| not_found(path, segment))?,
                _ => return Err(not_found(path, segment)),
            };
        }
        current = Some(child);
    }
    current.ok_or_else(|| not_found(path, path))
}

/// Mutable counterpart of [`resolve`].
pub fn resolve_mut<'a>(root: &'a mut ParameterNode, path: &str) -> Result<&'a mut Node, PathError> {
    // The first segment is resolved against the root outside the loop so the
    // borrow of `root.children` is taken exactly once (E0499 otherwise).
    let mut segments = path.split('.');
    let first = segments.next().ok_or_else(|| not_found(path, path))?;
    let (name, index) = split_segment(path, first)?;
    let mut current = root
        .children
        .get_mut(name)
        .ok_or_else(|| not_found(path, name))?;
    if let Some(index) = index {
        current = match current {
            Node::Scale(scale) => scale
                .brackets
                .get_mut(index)
                .ok_or_else(|| not_found(path, first))?,
            _ => return Err(not_found(path, first)),
        };
    }
    for segment in segments {
        let (name, index) = split_segment(path, segment)?;
        let children = match current {
            Node::Internal(node) => &mut node.children,
            _ => return Err(not_found(path, segment)),
        };
        let mut child = children
            .get_mut(name)
            .ok_or_else(|| not_found(path, name))?;
        if let Some(index) = index {
            child = match child {
                Node::Scale(scale) => scale
                    .brackets
                    .get_mut(index)
                    .ok_or_else(|| not_found(path, segment))?,
                _ => return Err(not_found(path, segment)),
            };
        }
        current = child;
    }
    Ok(current)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::{Metadata, Parameter, ParameterScale, ValueEntry};
    use rstest::rstest;

    fn leaf(name: &str, value: f64) -> Node {
        Node::Leaf(Parameter::new(
            name,
            vec![ValueEntry {
                instant: "2020-01-01".parse().unwrap(),
                value,
            }],
            Metadata::default(),
        ))
    }

    fn sample_tree() -> ParameterNode {
        let mut bracket0 = ParameterNode::new("tax.brackets[0]");
        bracket0
            .children
            .insert("rate".to_string(), leaf("tax.brackets[0].rate", 0.2));
        let mut bracket1 = ParameterNode::new("tax.brackets[1]");
        bracket1
            .children
            .insert("rate".to_string(), leaf("tax.brackets[1].rate", 0.4));

        let mut tax = ParameterNode::new("tax");
        tax.children
            .insert("allowance".to_string(), leaf("tax.allowance", 12500.0));
        tax.children.insert(
            "brackets".to_string(),
            Node::Scale(ParameterScale {
                name: "tax.brackets".to_string(),
                brackets: vec![Node::Internal(bracket0), Node::Internal(bracket1)],
                metadata: Metadata::default(),
            }),
        );

        let mut root = ParameterNode::new("root");
        root.children.insert("tax".to_string(), Node::Internal(tax));
        root
    }

    #[test]
    fn test_resolves_nested_leaf() {
        let root = sample_tree();
        let node = resolve(&root, "tax.allowance").unwrap();
        assert_eq!(node.as_leaf().unwrap().name, "tax.allowance");
    }

    #[test]
    fn test_resolves_bracket_component() {
        let root = sample_tree();
        let node = resolve(&root, "tax.brackets[1].rate").unwrap();
        assert_eq!(node.as_leaf().unwrap().name, "tax.brackets[1].rate");

        // A path may also end at the bracket itself.
        assert!(matches!(
            resolve(&root, "tax.brackets[0]").unwrap(),
            Node::Internal(_)
        ));
    }

    #[test]
    fn test_not_found_names_first_failing_segment() {
        let root = sample_tree();
        match resolve(&root, "tax.missing.rate").unwrap_err() {
            PathError::NotFound { segment, .. } => assert_eq!(segment, "missing"),
            other => panic!("wrong error: {:?}", other),
        }
        // Bracket index out of range is a miss, not a syntax error.
        match resolve(&root, "tax.brackets[7].rate").unwrap_err() {
            PathError::NotFound { segment, .. } => assert_eq!(segment, "brackets[7]"),
            other => panic!("wrong error: {:?}", other),
        }
        // Descending through a leaf is a miss at the extra segment.
        match resolve(&root, "tax.allowance.extra").unwrap_err() {
            PathError::NotFound { segment, .. } => assert_eq!(segment, "extra"),
            other => panic!("wrong error: {:?}", other),
        }
    }

    #[rstest]
    #[case("tax.brackets[x].rate")] // non-integer index
    #[case("tax.brackets[1")] // unterminated
    #[case("tax.brackets]1[")] // reversed
    #[case("tax.[1].rate")] // empty name
    #[case("tax.brackets[1]x.rate")] // trailing garbage
    #[case("tax.brackets[1][2]")] // double index
    fn test_invalid_bracket_syntax(#[case] path: &str) {
        let root = sample_tree();
        assert!(
            matches!(resolve(&root, path), Err(PathError::InvalidSyntax { .. })),
            "should be a syntax error: '{}'",
            path
        );
    }

    #[test]
    fn test_resolve_mut_allows_in_place_edits() {
        let mut root = sample_tree();
        {
            let node = resolve_mut(&mut root, "tax.allowance").unwrap();
            node.as_leaf_mut().unwrap().values[0].value = 13000.0;
        }
        let node = resolve(&root, "tax.allowance").unwrap();
        assert_eq!(node.as_leaf().unwrap().values[0].value, 13000.0);
    }
}
