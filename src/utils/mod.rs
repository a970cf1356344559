//! Small shared helpers.

pub mod paths;

pub use paths::{clean_path, normalize_path};
