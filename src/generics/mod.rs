//! Binding of generic supertypes across a class hierarchy.

mod binder;
mod hierarchy;
mod supers;

pub use binder::*;
pub use hierarchy::*;
pub use supers::*;
