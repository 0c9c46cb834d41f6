//! Fills gaps between a leaf's explicit entries at a declared cadence.
//!
//! For every leaf carrying an `interpolation` spec, adjacent explicit
//! entries are processed in chronological order. Starting from the earlier
//! entry, the pass steps forward one cadence unit at a time until it lands
//! exactly on an explicit entry, then synthesizes a linearly interpolated
//! value at every intermediate step.

use crate::passes::error::PassError;
use crate::temporal::{Cadence, Instant};
use crate::tree::{Node, Parameter, ParameterNode, ValueEntry};
use std::collections::HashSet;

pub fn interpolate(root: &mut ParameterNode) -> Result<(), PassError> {
    for child in root.children.values_mut() {
        visit(child)?;
    }
    Ok(())
}

fn visit(node: &mut Node) -> Result<(), PassError> {
    match node {
        Node::Leaf(parameter) => {
            if let Some(spec) = parameter.metadata.interpolation {
                interpolate_leaf(parameter, spec.interval)?;
            }
        }
        Node::Internal(internal) => {
            for child in internal.children.values_mut() {
                visit(child)?;
            }
        }
        Node::Scale(scale) => {
            for bracket in &mut scale.brackets {
                visit(bracket)?;
            }
        }
    }
    Ok(())
}

fn interpolate_leaf(parameter: &mut Parameter, interval: Cadence) -> Result<(), PassError> {
    if parameter.values.len() < 2 {
        return Ok(());
    }

    // The series is stored descending; work on an ascending copy.
    let ascending: Vec<ValueEntry> = parameter.values.iter().rev().copied().collect();
    let explicit: HashSet<Instant> = ascending.iter().map(|e| e.instant).collect();
    let final_instant = ascending[ascending.len() - 1].instant;

    let mut synthesized = Vec::new();
    for pair in ascending.windows(2) {
        let (start, end) = (pair[0], pair[1]);

        // Count cadence steps until an explicit entry is reached. Stepping
        // strictly increases the instant, so passing the final explicit
        // entry proves the cadence can never align.
        let mut steps: u32 = 1;
        loop {
            let stepped = start.instant.offset(steps, interval);
            if explicit.contains(&stepped) {
                break;
            }
            if stepped > final_instant {
                return Err(PassError::InterpolationAlignment {
                    parameter: parameter.name.clone(),
                    start: start.instant,
                    target: end.instant,
                    interval,
                });
            }
            steps += 1;
        }

        for j in 1..steps {
            synthesized.push(ValueEntry {
                instant: start.instant.offset(j, interval),
                value: start.value + (end.value - start.value) * f64::from(j) / f64::from(steps),
            });
        }
    }

    parameter.values.extend(synthesized);
    parameter.normalize();
    Ok(())
}
