//! Form state module

mod field_value;
mod form_state;

pub use field_value::*;
pub use form_state::*;
