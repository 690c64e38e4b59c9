//! Form rendering module
//!
//! - `field_renderer`: per-field-type rendering dispatch
//! - `employment_form`: the employment record form screen

mod employment_form;
mod field_renderer;

pub use employment_form::draw as draw_employment_form;
pub use field_renderer::{draw_field, field_height, selected_currency};
