mod pool;
mod types;

pub use pool::*;
pub use types::*;
