//! Path utilities.
//!
//! - [`fs`]: Filesystem path normalization (`normalize_path`, `expand_path`)
//! - [`key`]: Relative asset paths and storage keys (`is_safe_relative`, `join_key`)

pub mod fs;
pub mod key;

pub use fs::{expand_path, normalize_path};
pub use key::{is_safe_relative, join_key};
