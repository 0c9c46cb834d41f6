//! The parameter tree: leaves holding temporal value series, internal nodes
//! holding named children, and scales holding ordered bracket nodes.

pub use self::metadata::{
    InterpolationSpec, Metadata, MetadataError, RoundingKind, RoundingSpec, UpratingSpec,
};
pub use self::node::{Node, Parameter, ParameterNode, ParameterScale, ValueEntry};

mod metadata;
mod node;
