//! Dotted/bracketed parameter addressing.

pub use self::resolver::{resolve, resolve_mut, PathError};

mod resolver;
