//! The structural transformation pipeline applied to a parameter tree
//! before it is handed to downstream computation.
//!
//! Passes mutate the root in place and run in a fixed order:
//! Interpolation → Uprating → Metadata Propagation → Homogenization.
//! Homogenization runs last because it synthesizes leaves that should
//! already follow the interpolated/uprated shape conventions, and
//! propagation must see the final explicit metadata before fanning it out.
//!
//! The pipeline runs once per tree construction. Running a pass twice is
//! not guaranteed to be a no-op, but any single run leaves every leaf
//! series sorted descending and duplicate-free.

pub use self::error::PassError;
pub use self::homogenization::{homogenize, EnumSource};
pub use self::interpolation::interpolate;
pub use self::propagation::propagate;
pub use self::uprating::uprate;

mod error;
mod homogenization;
mod interpolation;
mod propagation;
mod uprating;

use crate::tree::ParameterNode;

/// Runs the four passes in order, stopping at the first fatal error.
pub fn run_pipeline(
    root: &mut ParameterNode,
    enums: &impl EnumSource,
    default_value: f64,
) -> Result<(), PassError> {
    interpolate(root)?;
    uprate(root)?;
    propagate(root);
    homogenize(root, enums, default_value);
    Ok(())
}
