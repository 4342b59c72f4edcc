//! Late-bound fragment loading.
//!
//! The shell never compiles against participant code; fragments are
//! resolved by name at runtime through a [`FragmentResolver`]. Failure
//! is a first-class return value, and the caller-visible outcome of a
//! failed load is a fallback view in the mount point, never a panic or
//! a half-inserted fragment.

pub mod loader;
pub mod mount;
pub mod resolver;

pub use loader::{FragmentHandle, FragmentLoader};
pub use mount::{MountContent, MountPoint};
pub use resolver::{Fragment, FragmentRegistry, FragmentResolver, LoadError};
