// FFI Facade: The main entry point for Python.
// This file declares the crate modules and, when the `python` feature is
// enabled, uses `pyo3` to define the `_core` Python module.

pub mod passes;
pub mod path;
pub mod temporal;
pub mod tree;

#[cfg(feature = "python")]
mod bindings {
    pub mod python;
}

#[cfg(feature = "python")]
use pyo3::prelude::*;

/// A simple function to confirm the Rust core is callable from Python.
#[cfg(feature = "python")]
#[pyfunction]
fn rust_core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

// --- Module Definition ---
/// This function defines the `_core` Python module. The name `_core` is
/// chosen to indicate it's an internal, compiled component.
#[cfg(feature = "python")]
#[pymodule]
fn _core(_py: Python, m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<bindings::python::PyParameterTree>()?;
    m.add_function(wrap_pyfunction!(rust_core_version, m)?)?;
    Ok(())
}
