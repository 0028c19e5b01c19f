// src/component/mod.rs

//! The component tree and its execution model.
//!
//! A [`Component`] is one process invocation plus the ordered subtrees that
//! must run strictly before and after it. The tree is owned top-down with no
//! parent links, so every pass (prefixing, population, execution, kill,
//! teardown) is a plain recursion over `before` then `after`.
//!
//! - [`populate`] resolves directories, opens log files and builds commands.
//! - [`template`] expands `{{ ... }}` placeholders in arguments.
//! - [`exec`] runs the tree: before → self → after, strictly sequential.
//! - [`tee`] owns log files and the output drain tasks.
//! - [`kill`] provides the cascading, best-effort kill.

pub mod exec;
pub mod kill;
pub mod populate;
pub mod tee;
pub mod template;

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tokio::task::JoinHandle;

pub use kill::{KillHandle, KillSwitch};
pub use populate::{PopulationState, Prepared};
pub use tee::Tee;

/// A node of the component tree.
///
/// The declarative fields mirror the configuration file. Everything marked
/// `#[serde(skip)]` is runtime state owned by this node alone.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Component {
    /// Fixed program-invocation prefix (interpreter plus fixed flags).
    pub entrypoint: Vec<String>,

    /// Extra arguments appended after `entrypoint`.
    pub cmd: Vec<String>,

    /// Free-form descriptor. Informational only.
    pub depends: String,

    /// Working directory, relative to the prefix until populated.
    pub workdir: PathBuf,

    /// Components run after this one, in order.
    pub after: Vec<Component>,

    /// Components run before this one, in order.
    pub before: Vec<Component>,

    pub tee: Tee,

    #[serde(skip)]
    prefix: PathBuf,

    #[serde(skip)]
    state: PopulationState,

    #[serde(skip)]
    kill_switch: KillSwitch,

    #[serde(skip)]
    drains: Vec<JoinHandle<()>>,
}

impl Component {
    /// Create a bare component that runs `entrypoint` with no arguments.
    pub fn new(entrypoint: impl Into<String>) -> Self {
        Self {
            entrypoint: vec![entrypoint.into()],
            ..Self::default()
        }
    }

    /// The full invocation array: `entrypoint` followed by `cmd`.
    pub fn invocation(&self) -> Vec<String> {
        self.entrypoint
            .iter()
            .chain(self.cmd.iter())
            .cloned()
            .collect()
    }

    /// Human-readable name used in logs, errors and log file names.
    pub fn display_name(&self) -> String {
        let invocation = self.invocation();
        if invocation.is_empty() {
            "<empty>".to_string()
        } else {
            invocation.join(" ")
        }
    }

    /// Display name made safe for use as a file name.
    pub fn log_name(&self) -> String {
        self.display_name()
            .chars()
            .map(|c| {
                if c.is_whitespace() || c == '/' || c == '\\' {
                    '_'
                } else {
                    c
                }
            })
            .collect()
    }

    /// Prefix recorded by [`Component::add_prefix`].
    pub fn prefix(&self) -> &Path {
        &self.prefix
    }

    /// Apply `prefix` to every descendant (before first, then after) and then
    /// to this node: `workdir` becomes `prefix/workdir`.
    ///
    /// Not idempotent. Call exactly once per tree, before population.
    pub fn add_prefix(&mut self, prefix: impl AsRef<Path>) {
        let prefix = prefix.as_ref();

        for child in &mut self.before {
            child.add_prefix(prefix);
        }
        for child in &mut self.after {
            child.add_prefix(prefix);
        }

        self.workdir = prefix.join(&self.workdir);
        self.prefix = prefix.to_path_buf();
    }

    pub fn is_populated(&self) -> bool {
        matches!(self.state, PopulationState::Populated(_))
    }

    /// Expanded invocation (program first) once the node is populated.
    pub fn prepared_invocation(&self) -> Option<&[String]> {
        match &self.state {
            PopulationState::Populated(prepared) => Some(prepared.invocation()),
            PopulationState::Unpopulated => None,
        }
    }
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display_name())
    }
}
