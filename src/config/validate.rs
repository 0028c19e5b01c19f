// src/config/validate.rs

use std::collections::HashMap;

use crate::component::Component;
use crate::errors::{Result, SpawnerError};

/// Check invariants that span the whole tree:
///
/// - every component has a non-empty invocation,
/// - no two components capturing output share a log file name.
pub fn validate_tree(root: &Component) -> Result<()> {
    let mut log_owners: HashMap<String, String> = HashMap::new();
    validate_node(root, "root", &mut log_owners)
}

fn validate_node(
    node: &Component,
    path: &str,
    log_owners: &mut HashMap<String, String>,
) -> Result<()> {
    if node.invocation().is_empty() {
        return Err(SpawnerError::Config(format!(
            "component at {path} has neither entrypoint nor cmd"
        )));
    }

    if node.tee.is_enabled() {
        let log_name = node.log_name();
        if let Some(other) = log_owners.get(&log_name) {
            return Err(SpawnerError::Config(format!(
                "components at {other} and {path} would both write log file '{log_name}'"
            )));
        }
        log_owners.insert(log_name, path.to_string());
    }

    for (i, child) in node.before.iter().enumerate() {
        validate_node(child, &format!("{path}.before[{i}]"), log_owners)?;
    }
    for (i, child) in node.after.iter().enumerate() {
        validate_node(child, &format!("{path}.after[{i}]"), log_owners)?;
    }

    Ok(())
}
