//! Form schema module

mod loader;
mod model;

pub use loader::*;
pub use model::*;
