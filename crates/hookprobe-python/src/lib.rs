//! Out-of-process introspection of installed Python packages
//!
//! Questions about third-party packages are answered by a fresh child
//! interpreter per query, so importing a package (and whatever that
//! package does at import time) never affects the calling process:
//!
//! 1. [`executor`] spawns the child with a scoped `PYTHONPATH`
//! 2. [`literal`] decodes the `repr()` the child prints, without evaluating it
//! 3. [`package`] and [`collect`] turn a package name into submodules,
//!    data files and shared libraries for a bundle
//! 4. [`resolvers`] locate optional framework resources (Qt, Django,
//!    PyOpenGL, six) and report absence as a [`Lookup`] instead of an error

pub mod collect;
pub mod env_override;
pub mod errors;
pub mod eval;
pub mod executor;
mod introspector;
pub mod literal;
pub mod package;
pub mod python_discovery;
pub mod query;
pub mod resolvers;

#[cfg(test)]
mod testing;

pub use errors::ProbeError;
pub use executor::{ExecutorOptions, Interpreter, PythonExecutor};
pub use introspector::Introspector;
pub use literal::PyLiteral;
pub use package::PackageLocation;
pub use python_discovery::{DiscoveryError, PythonEnvironment};
pub use query::Query;
pub use resolvers::qt::QtBinding;
pub use resolvers::Lookup;
