//! Reading the comparison table from disk.

pub mod loader;

pub use loader::*;
