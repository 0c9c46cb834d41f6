//! Pushes inheritable metadata from flagged nodes to all their descendants.
//!
//! A node with `propagate_metadata_to_children: true` propagates its
//! metadata to the entire subtree below it, at every depth, in one top-down
//! sweep. Fields the ancestor declares overwrite the descendant's;
//! everything else the descendant carries is preserved. A flagged node
//! nested under an already-propagating ancestor does not open a new scope:
//! the outermost flagged ancestor wins.

use crate::tree::{Metadata, Node, ParameterNode};

pub fn propagate(root: &mut ParameterNode) {
    let scope = root
        .metadata
        .propagate_to_children
        .then(|| root.metadata.clone());
    for child in root.children.values_mut() {
        visit(child, scope.as_ref());
    }
}

fn visit(node: &mut Node, inherited: Option<&Metadata>) {
    if let Some(ancestor) = inherited {
        node.metadata_mut().merge_from(ancestor);
    }

    let scope = match inherited {
        // Already inside a propagation scope: keep carrying the outermost
        // ancestor's snapshot.
        Some(ancestor) => Some(ancestor.clone()),
        None => node
            .metadata()
            .propagate_to_children
            .then(|| node.metadata().clone()),
    };

    match node {
        Node::Leaf(_) => {}
        Node::Internal(internal) => {
            for child in internal.children.values_mut() {
                visit(child, scope.as_ref());
            }
        }
        Node::Scale(scale) => {
            for bracket in &mut scale.brackets {
                visit(bracket, scope.as_ref());
            }
        }
    }
}
