//! Configuration sources, one per layer.

pub mod environment;
pub mod explicit_file;
pub mod global_file;
