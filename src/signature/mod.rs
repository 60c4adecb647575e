mod parser;
mod types;

pub use parser::*;
pub use types::*;
