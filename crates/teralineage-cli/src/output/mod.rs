//! Output formatting.

pub mod json;

pub use json::format_json;
