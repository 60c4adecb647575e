//! Expression trees and the protocol for rewriting them.

mod method_ref;
mod rewrite;
mod types;

pub use method_ref::*;
pub use rewrite::*;
pub use types::*;
