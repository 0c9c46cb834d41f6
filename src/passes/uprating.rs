//! Extrapolates leaves forward in time using the ratio of an index
//! parameter.
//!
//! The pass runs in two phases: an immutable walk first collects every leaf
//! carrying an `uprating` spec, then each target is processed against a
//! snapshot of its index series. The split keeps the read of the index
//! parameter (an arbitrary path from the root) separate from the mutation
//! of the target leaf.
//!
//! All extrapolated points are derived from one fixed anchor: the leaf's
//! latest explicit entry as it stood when the pass reached it. They are
//! never chained from previously synthesized points, so the extrapolated
//! series is a pure scalar multiple of the index series shifted to the
//! anchor, independent of processing order.

use crate::passes::error::PassError;
use crate::path::{resolve, resolve_mut, PathError};
use crate::tree::{Node, ParameterNode, UpratingSpec, ValueEntry};

pub fn uprate(root: &mut ParameterNode) -> Result<(), PassError> {
    // Phase 1: collect targets. BTreeMap children make the order
    // deterministic, though anchoring makes results order-independent
    // anyway.
    let mut targets: Vec<(String, UpratingSpec)> = Vec::new();
    root.for_each_leaf(&mut |path, leaf| {
        if let Some(spec) = &leaf.metadata.uprating {
            targets.push((path.to_string(), spec.clone()));
        }
    });

    // Phase 2: apply.
    for (path, spec) in targets {
        uprate_leaf(root, &path, &spec)?;
    }
    Ok(())
}

fn uprate_leaf(root: &mut ParameterNode, path: &str, spec: &UpratingSpec) -> Result<(), PassError> {
    let index_not_found = |source: Option<PathError>| PassError::IndexParameterNotFound {
        parameter: path.to_string(),
        index: spec.parameter.clone(),
        source,
    };

    // Snapshot the index series before borrowing the target mutably.
    let index = match resolve(root, &spec.parameter) {
        Ok(Node::Leaf(parameter)) => parameter.clone(),
        Ok(_) => return Err(index_not_found(None)),
        Err(e) => return Err(index_not_found(Some(e))),
    };

    let Some(leaf) = resolve_mut(root, path)?.as_leaf_mut() else {
        return Ok(());
    };
    // The anchor is fixed before anything is appended; entries synthesized
    // below never shift it.
    let Some(anchor) = leaf.latest().copied() else {
        return Ok(());
    };
    let index_at_anchor = index
        .value_at(anchor.instant)
        .ok_or_else(|| index_not_found(None))?;

    let mut appended = Vec::new();
    for entry in index.values.iter().rev() {
        if entry.instant <= anchor.instant {
            continue;
        }
        let mut uprated = anchor.value * entry.value / index_at_anchor;
        if let Some(rounding) = &spec.rounding {
            uprated = rounding.apply(uprated);
        }
        appended.push(ValueEntry {
            instant: entry.instant,
            value: uprated,
        });
    }

    leaf.values.extend(appended);
    leaf.normalize();
    Ok(())
}
