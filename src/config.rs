//! Controller configuration: types, file loading and overrides.

pub mod types;
pub mod loader;
