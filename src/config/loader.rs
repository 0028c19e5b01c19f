// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::component::Component;
use crate::config::validate::validate_tree;
use crate::errors::Result;

/// Load a component tree from `path`.
///
/// Files ending in `.toml` are parsed as TOML; anything else as YAML. The
/// root of the document is the root component:
///
/// ```yaml
/// entrypoint: ["sh", "-c"]
/// cmd: ["make test"]
/// tee:
///   combined: true
/// before:
///   - cmd: ["make", "build"]
/// ```
///
/// This only performs deserialization. Use [`load_and_validate`] to also
/// check tree-wide invariants.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<Component> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let is_toml = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));

    let component: Component = if is_toml {
        toml::from_str(&contents)?
    } else {
        serde_yaml::from_str(&contents)?
    };

    debug!(path = ?path, root = %component, "loaded component tree");
    Ok(component)
}

/// Load a component tree and validate it.
///
/// This is the entry point used by [`crate::run`].
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<Component> {
    let component = load_from_path(&path)?;
    validate_tree(&component)?;
    Ok(component)
}

/// Config file used when `--config` is not given.
pub fn default_config_path() -> PathBuf {
    PathBuf::from("spawner.yaml")
}
