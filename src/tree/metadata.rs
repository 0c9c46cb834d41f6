//! Typed parameter metadata.
//!
//! The source configuration carries metadata as untyped maps. Rather than
//! re-interpreting those maps inside every pass, the recognized keys are
//! parsed once, at tree construction, into a closed set of typed fields.
//! Unrecognized keys survive in `extra` so metadata propagation can carry
//! host-specific annotations (labels, references, units) down the tree.

use crate::temporal::Cadence;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::warn;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MetadataError {
    #[error("metadata for '{node}' is not a map")]
    NotAMap { node: String },
    #[error("invalid interpolation metadata for '{node}': {reason}")]
    InvalidInterpolation { node: String, reason: String },
    #[error("invalid uprating metadata for '{node}': {reason}")]
    InvalidUprating { node: String, reason: String },
}

/// Declares that gaps between a leaf's explicit entries are filled at the
/// given cadence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterpolationSpec {
    pub interval: Cadence,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoundingKind {
    Nearest,
    Upwards,
    Downwards,
}

/// Rounds uprated values to a multiple of `interval`.
///
/// The source form is either a bare number (nearest-multiple rounding) or a
/// `{interval, type}` map.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "RoundingRepr")]
pub struct RoundingSpec {
    pub interval: f64,
    #[serde(rename = "type")]
    pub kind: RoundingKind,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RoundingRepr {
    Full {
        interval: f64,
        #[serde(rename = "type")]
        kind: RoundingKind,
    },
    Bare(f64),
}

impl From<RoundingRepr> for RoundingSpec {
    fn from(repr: RoundingRepr) -> Self {
        match repr {
            RoundingRepr::Full { interval, kind } => Self { interval, kind },
            RoundingRepr::Bare(interval) => Self {
                interval,
                kind: RoundingKind::Nearest,
            },
        }
    }
}

impl RoundingSpec {
    pub fn apply(&self, value: f64) -> f64 {
        let scaled = value / self.interval;
        let rounded = match self.kind {
            RoundingKind::Nearest => scaled.round(),
            RoundingKind::Upwards => scaled.ceil(),
            RoundingKind::Downwards => scaled.floor(),
        };
        rounded * self.interval
    }
}

/// Declares that a leaf is extrapolated forward by the ratio of the index
/// parameter at `parameter` (a dotted path from the tree root).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpratingSpec {
    pub parameter: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rounding: Option<RoundingSpec>,
}

/// The closed set of metadata fields recognized by the pipeline.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Metadata {
    pub interpolation: Option<InterpolationSpec>,
    pub uprating: Option<UpratingSpec>,
    pub breakdown: Option<Vec<String>>,
    pub propagate_to_children: bool,
    /// Unrecognized keys, preserved verbatim.
    pub extra: BTreeMap<String, Value>,
}

impl Metadata {
    /// Parses an untyped metadata map.
    ///
    /// `node` is the dotted name of the owning node, used in diagnostics.
    /// Malformed `interpolation`/`uprating` structures are fatal; a malformed
    /// `breakdown` is logged and dropped, matching the non-fatal policy of
    /// the homogenization pass.
    pub fn from_value(node: &str, value: &Value) -> Result<Self, MetadataError> {
        let map = match value {
            Value::Null => return Ok(Self::default()),
            Value::Object(map) => map,
            _ => {
                return Err(MetadataError::NotAMap {
                    node: node.to_string(),
                })
            }
        };

        let mut metadata = Self::default();
        for (key, value) in map {
            match key.as_str() {
                "interpolation" => {
                    metadata.interpolation = Some(
                        serde_json::from_value(value.clone()).map_err(|e| {
                            MetadataError::InvalidInterpolation {
                                node: node.to_string(),
                                reason: e.to_string(),
                            }
                        })?,
                    );
                }
                "uprating" => {
                    metadata.uprating = Some(serde_json::from_value(value.clone()).map_err(
                        |e| MetadataError::InvalidUprating {
                            node: node.to_string(),
                            reason: e.to_string(),
                        },
                    )?);
                }
                "breakdown" => metadata.breakdown = parse_breakdown(node, value),
                "propagate_metadata_to_children" => {
                    metadata.propagate_to_children = value.as_bool().unwrap_or(false);
                }
                _ => {
                    metadata.extra.insert(key.clone(), value.clone());
                }
            }
        }
        Ok(metadata)
    }

    /// Merges a propagating ancestor's metadata over this node's.
    ///
    /// Fields the ancestor declares win; fields it leaves unset are kept.
    pub fn merge_from(&mut self, ancestor: &Metadata) {
        if ancestor.interpolation.is_some() {
            self.interpolation = ancestor.interpolation;
        }
        if ancestor.uprating.is_some() {
            self.uprating = ancestor.uprating.clone();
        }
        if ancestor.breakdown.is_some() {
            self.breakdown = ancestor.breakdown.clone();
        }
        if ancestor.propagate_to_children {
            self.propagate_to_children = true;
        }
        for (key, value) in &ancestor.extra {
            self.extra.insert(key.clone(), value.clone());
        }
    }
}

/// A breakdown is one enumeration name or a list of them (innermost last).
/// Anything else is reported and treated as absent.
fn parse_breakdown(node: &str, value: &Value) -> Option<Vec<String>> {
    match value {
        Value::String(name) => Some(vec![name.clone()]),
        Value::Array(items) => {
            let names: Option<Vec<String>> = items
                .iter()
                .map(|item| item.as_str().map(str::to_string))
                .collect();
            if names.is_none() {
                warn!(node, "invalid breakdown metadata: non-string list entry");
            }
            names
        }
        other => {
            warn!(
                node,
                kind = classify(other),
                "invalid breakdown metadata: expected a string or list of strings"
            );
            None
        }
    }
}

fn classify(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
