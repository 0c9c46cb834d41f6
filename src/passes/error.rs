//! Defines the error type shared by the transformation passes.
//!
//! Every variant here is fatal: it signals a broken configuration, not a
//! runtime condition to recover from. The recoverable homogenization
//! diagnostics (unexpected children, malformed breakdowns) are emitted as
//! `tracing` warnings instead.

use crate::path::PathError;
use crate::temporal::{Cadence, Instant};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PassError {
    /// A structural address inside the tree failed to resolve.
    #[error(transparent)]
    Path(#[from] PathError),

    /// The declared interpolation cadence never lands on the next explicit
    /// entry of the leaf.
    #[error(
        "interpolation for '{parameter}': stepping by {interval:?} from {start} \
         never reaches the explicit entry at {target}"
    )]
    InterpolationAlignment {
        parameter: String,
        start: Instant,
        target: Instant,
        interval: Cadence,
    },

    /// An uprating declaration references an index parameter that does not
    /// resolve to a leaf, or whose series does not cover the anchor instant.
    #[error("uprating index '{index}' for parameter '{parameter}' could not be resolved")]
    IndexParameterNotFound {
        parameter: String,
        index: String,
        #[source]
        source: Option<PathError>,
    },
}
