//! Records kept by the store.
//!
//! - [`Project`]: a named environment with an optional working directory.
//! - [`Package`]: a package name owned by one project. Deleting a project leaves
//!   its package rows in place.

mod package;
mod project;

pub use package::*;
pub use project::*;
