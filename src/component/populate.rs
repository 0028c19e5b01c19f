// src/component/populate.rs

//! One-time setup of a component tree before execution.
//!
//! Population performs every fallible, side-effecting preparation step
//! (directories, log files, template expansion, command construction)
//! top-down before any process is started. `exec` only re-enters it for
//! nodes still [`PopulationState::Unpopulated`].

use std::fs::DirBuilder;
use std::path::Path;

use tokio::process::Command;
use tracing::debug;

use crate::errors::{Result, SpawnerError, Stream};

use super::Component;
use super::template::expand_args;

/// Whether a component has been prepared for execution.
#[derive(Debug, Default)]
pub enum PopulationState {
    #[default]
    Unpopulated,
    Populated(Prepared),
}

/// Everything `exec` needs to start a component's process.
#[derive(Debug)]
pub struct Prepared {
    command: Command,
    invocation: Vec<String>,
}

impl Prepared {
    /// Expanded invocation; the first element is the program.
    pub fn invocation(&self) -> &[String] {
        &self.invocation
    }

    pub(crate) fn command_mut(&mut self) -> &mut Command {
        &mut self.command
    }
}

impl Component {
    /// Populate `before` children, then `after` children, then this node.
    ///
    /// Fails fast: the first error aborts population of the remaining tree.
    pub fn populate(&mut self) -> Result<()> {
        for child in &mut self.before {
            child.populate()?;
        }
        for child in &mut self.after {
            child.populate()?;
        }

        self.populate_self()
    }

    fn populate_self(&mut self) -> Result<()> {
        let name = self.display_name();

        let workdir = std::path::absolute(&self.workdir).map_err(|source| {
            SpawnerError::Filesystem {
                component: name.clone(),
                path: self.workdir.clone(),
                source,
            }
        })?;
        self.workdir = workdir;

        let invocation = self.invocation();
        if invocation.is_empty() {
            return Err(SpawnerError::Config(
                "neither entrypoint nor cmd provided".to_string(),
            ));
        }

        create_workdir(&self.workdir).map_err(|source| SpawnerError::Filesystem {
            component: name.clone(),
            path: self.workdir.clone(),
            source,
        })?;

        let log_base = self.prefix.join(self.log_name());
        self.tee
            .open(&log_base)
            .map_err(|(path, source)| SpawnerError::Filesystem {
                component: name.clone(),
                path,
                source,
            })?;

        let invocation =
            expand_args(self, invocation).map_err(|source| SpawnerError::Template {
                component: name.clone(),
                source,
            })?;

        let Some((program, args)) = invocation.split_first() else {
            return Err(SpawnerError::Config(format!("{name}: empty invocation")));
        };

        let mut command = Command::new(program);
        command
            .args(args)
            .current_dir(&self.workdir)
            .stdout(self.tee.stdio(Stream::Stdout))
            .stderr(self.tee.stdio(Stream::Stderr))
            .kill_on_drop(true);

        debug!(
            component = %name,
            workdir = %self.workdir.display(),
            ?invocation,
            "component populated"
        );

        self.state = PopulationState::Populated(Prepared {
            command,
            invocation,
        });

        Ok(())
    }
}

fn create_workdir(path: &Path) -> std::io::Result<()> {
    let mut builder = DirBuilder::new();
    builder.recursive(true);

    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(0o777);
    }

    builder.create(path)
}
