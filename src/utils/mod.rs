//! Small helpers shared across modules.

pub mod json_path;

pub use json_path::{descend, get_path, get_string};
