// src/config/mod.rs

//! Loading and validation of component tree definitions.
//!
//! Responsibilities:
//! - Read a component tree from YAML or TOML (`loader.rs`).
//! - Check tree-wide invariants before anything runs (`validate.rs`).

pub mod loader;
pub mod validate;

pub use loader::{default_config_path, load_and_validate, load_from_path};
pub use validate::validate_tree;
