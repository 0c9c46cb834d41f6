//! The pyo3 surface exposed to the host Python package.
//!
//! The host parses its source configuration itself and hands the tree over
//! through the builder methods here, runs the pipeline once, then queries
//! values and series back out. Metadata and enumeration tables cross the
//! boundary as JSON strings.

use crate::passes;
use crate::path::{resolve, resolve_mut, split_segment};
use crate::temporal::Instant;
use crate::tree::{Metadata, Node, Parameter, ParameterNode, ParameterScale, ValueEntry};
use pyo3::exceptions::{PyRuntimeError, PyValueError};
use pyo3::prelude::*;
use std::collections::BTreeMap;
use std::fmt::Display;

fn to_value_err(e: impl Display) -> PyErr {
    PyValueError::new_err(e.to_string())
}

fn parse_metadata(node: &str, json: Option<&str>) -> PyResult<Metadata> {
    match json {
        None => Ok(Metadata::default()),
        Some(raw) => {
            let value: serde_json::Value = serde_json::from_str(raw).map_err(to_value_err)?;
            Metadata::from_value(node, &value).map_err(to_value_err)
        }
    }
}

fn parse_entries(entries: Vec<(String, f64)>) -> PyResult<Vec<ValueEntry>> {
    entries
        .into_iter()
        .map(|(date, value)| {
            let instant: Instant = date.parse().map_err(to_value_err)?;
            Ok(ValueEntry { instant, value })
        })
        .collect()
}

/// Walks `path` to its final slot, creating missing intermediate internal
/// nodes. Bracket segments must address an existing scale.
fn ensure_slot<'a>(root: &'a mut ParameterNode, path: &str) -> PyResult<&'a mut Node> {
    let segments: Vec<&str> = path.split('.').collect();
    let mut children = &mut root.children;
    let mut prefix = String::new();

    for (i, segment) in segments.iter().enumerate() {
        let (name, index) = split_segment(path, segment).map_err(to_value_err)?;
        if name.is_empty() {
            return Err(PyValueError::new_err(format!(
                "empty segment in path '{}'",
                path
            )));
        }
        let full_name = if prefix.is_empty() {
            name.to_string()
        } else {
            format!("{}.{}", prefix, name)
        };

        let slot = children
            .entry(name.to_string())
            .or_insert_with(|| Node::Internal(ParameterNode::new(full_name.clone())));

        let slot = match index {
            None => slot,
            Some(index) => match slot {
                Node::Scale(scale) => scale.brackets.get_mut(index).ok_or_else(|| {
                    PyValueError::new_err(format!(
                        "bracket index {} out of range at '{}'",
                        index, full_name
                    ))
                })?,
                _ => {
                    return Err(PyValueError::new_err(format!(
                        "'{}' is not a scale",
                        full_name
                    )))
                }
            },
        };

        if i + 1 == segments.len() {
            return Ok(slot);
        }
        prefix = match index {
            None => full_name,
            Some(index) => format!("{}[{}]", full_name, index),
        };
        children = match slot {
            Node::Internal(node) => &mut node.children,
            _ => {
                return Err(PyValueError::new_err(format!(
                    "'{}' is not an internal node",
                    prefix
                )))
            }
        };
    }
    Err(PyValueError::new_err(format!("empty path '{}'", path)))
}

#[pyclass(name = "_ParameterTree")]
#[derive(Debug, Clone, Default)]
pub struct PyParameterTree {
    root: ParameterNode,
}

#[pymethods]
impl PyParameterTree {
    #[new]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a leaf at `path`, creating intermediate internal nodes.
    /// Entries are `(YYYY-MM-DD, value)` pairs; `metadata_json` is an
    /// optional JSON object with the usual metadata keys.
    #[pyo3(signature = (path, entries, metadata_json=None))]
    pub fn add_parameter(
        &mut self,
        path: &str,
        entries: Vec<(String, f64)>,
        metadata_json: Option<&str>,
    ) -> PyResult<()> {
        let metadata = parse_metadata(path, metadata_json)?;
        let values = parse_entries(entries)?;
        let slot = ensure_slot(&mut self.root, path)?;
        *slot = Node::Leaf(Parameter::new(path, values, metadata));
        Ok(())
    }

    /// Inserts a scale with `brackets` empty bracket nodes at `path`.
    /// Bracket components are then added via bracket paths, e.g.
    /// `tax.brackets[0].rate`.
    #[pyo3(signature = (path, brackets, metadata_json=None))]
    pub fn add_scale(
        &mut self,
        path: &str,
        brackets: usize,
        metadata_json: Option<&str>,
    ) -> PyResult<()> {
        let metadata = parse_metadata(path, metadata_json)?;
        let scale = ParameterScale {
            name: path.to_string(),
            brackets: (0..brackets)
                .map(|i| Node::Internal(ParameterNode::new(format!("{}[{}]", path, i))))
                .collect(),
            metadata,
        };
        let slot = ensure_slot(&mut self.root, path)?;
        *slot = Node::Scale(scale);
        Ok(())
    }

    /// Replaces the metadata of an existing node.
    pub fn set_metadata(&mut self, path: &str, metadata_json: &str) -> PyResult<()> {
        let metadata = parse_metadata(path, Some(metadata_json))?;
        let node = resolve_mut(&mut self.root, path).map_err(to_value_err)?;
        *node.metadata_mut() = metadata;
        Ok(())
    }

    /// Runs Interpolation → Uprating → Propagation → Homogenization once.
    /// `enums_json` maps enumeration names to ordered label lists.
    pub fn run_pipeline(&mut self, enums_json: &str, default_value: f64) -> PyResult<()> {
        let enums: BTreeMap<String, Vec<String>> =
            serde_json::from_str(enums_json).map_err(to_value_err)?;
        passes::run_pipeline(&mut self.root, &enums, default_value)
            .map_err(|e| PyRuntimeError::new_err(e.to_string()))
    }

    /// The value of the leaf at `path` effective at `date`, or `None` if
    /// the series has no entry at or before it.
    pub fn value_at(&self, path: &str, date: &str) -> PyResult<Option<f64>> {
        let instant: Instant = date.parse().map_err(to_value_err)?;
        let leaf = self.leaf_at(path)?;
        Ok(leaf.value_at(instant))
    }

    /// The full series of the leaf at `path`, latest first.
    pub fn entries(&self, path: &str) -> PyResult<Vec<(String, f64)>> {
        let leaf = self.leaf_at(path)?;
        Ok(leaf
            .values
            .iter()
            .map(|e| (e.instant.to_string(), e.value))
            .collect())
    }

    /// The child names of the node at `path`, or `None` for a leaf.
    pub fn child_names(&self, path: &str) -> PyResult<Option<Vec<String>>> {
        let node = resolve(&self.root, path).map_err(to_value_err)?;
        Ok(match node {
            Node::Leaf(_) => None,
            Node::Internal(internal) => Some(internal.children.keys().cloned().collect()),
            Node::Scale(scale) => Some(
                (0..scale.brackets.len())
                    .map(|i| format!("[{}]", i))
                    .collect(),
            ),
        })
    }
}

impl PyParameterTree {
    fn leaf_at(&self, path: &str) -> PyResult<&Parameter> {
        let node = resolve(&self.root, path).map_err(to_value_err)?;
        node.as_leaf()
            .ok_or_else(|| PyValueError::new_err(format!("'{}' is not a leaf parameter", path)))
    }
}
