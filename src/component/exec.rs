// src/component/exec.rs

//! Execution of a populated component tree.
//!
//! Order is strictly sequential: every `before` subtree (depth-first, in
//! order), then this component's own process, then every `after` subtree.
//! The first failure aborts the rest of the plan and is returned as-is.
//!
//! The only concurrency is inside a single component: its routed stdout and
//! stderr are drained into log files by two detached tasks while the
//! process runs. `exec` does not wait for them; [`Component::close`] does.

use std::future::Future;
use std::io;
use std::pin::Pin;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::errors::{ExecutionFailure, Result, SpawnerError, Stream};

use super::populate::PopulationState;
use super::tee::spawn_drain;
use super::Component;

/// How long [`Component::close`] waits for output drains.
pub const DRAIN_GRACE: Duration = Duration::from_secs(5);

impl Component {
    /// Run this component tree.
    ///
    /// Populates lazily if [`Component::populate`] was not called. A fired
    /// `cancel` token kills the running process and fails the component.
    pub fn exec<'a>(
        &'a mut self,
        cancel: &'a CancellationToken,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>> {
        Box::pin(async move {
            if !self.is_populated() {
                self.populate().map_err(|source| SpawnerError::Populate {
                    component: self.display_name(),
                    source: Box::new(source),
                })?;
            }

            for child in &mut self.before {
                child.exec(cancel).await?;
            }

            self.run_process(cancel).await?;

            for child in &mut self.after {
                child.exec(cancel).await?;
            }

            Ok(())
        })
    }

    /// Start this component's own process, wire up the drains and wait for
    /// it to exit.
    async fn run_process(&mut self, cancel: &CancellationToken) -> Result<()> {
        let name = self.display_name();

        let prepared = match &mut self.state {
            PopulationState::Populated(prepared) => prepared,
            PopulationState::Unpopulated => {
                return Err(SpawnerError::Config(format!(
                    "component {name} was not populated"
                )));
            }
        };

        if cancel.is_cancelled() {
            return Err(SpawnerError::execution(name, ExecutionFailure::Cancelled));
        }

        let kill_switch = self.kill_switch.clone();
        let killed = kill_switch.tripped();
        tokio::pin!(killed);

        info!(
            component = %name,
            workdir = %self.workdir.display(),
            depends = %self.depends,
            "starting component process"
        );

        // Marked before spawn so a kill issued while the process starts is
        // delivered to the already registered `killed` future.
        kill_switch.set_running(true);

        let mut child = match prepared.command_mut().spawn() {
            Ok(child) => child,
            Err(e) => {
                kill_switch.set_running(false);
                return Err(SpawnerError::execution(&name, ExecutionFailure::Start(e)));
            }
        };

        let out = child.stdout.take();
        let err = child.stderr.take();
        let drained = self
            .drain(&name, Stream::Stdout, out)
            .and_then(|()| self.drain(&name, Stream::Stderr, err));

        if let Err(e) = drained {
            warn!(component = %name, error = %e, "output capture failed; killing component process");
            if let Err(kill_err) = child.kill().await {
                warn!(component = %name, error = %kill_err, "failed to kill component process");
            }
            kill_switch.set_running(false);
            return Err(e);
        }

        let outcome = tokio::select! {
            status = child.wait() => match status {
                Ok(status) if status.success() => Ok(()),
                Ok(status) => Err(ExecutionFailure::Exit(status)),
                Err(e) => Err(ExecutionFailure::Wait(e)),
            },

            _ = &mut killed => {
                if let Err(e) = child.kill().await {
                    warn!(component = %name, error = %e, "failed to kill component process");
                }
                Err(ExecutionFailure::Killed)
            }

            _ = cancel.cancelled() => {
                info!(component = %name, "cancellation requested; killing component process");
                if let Err(e) = child.kill().await {
                    warn!(component = %name, error = %e, "failed to kill component process");
                }
                Err(ExecutionFailure::Cancelled)
            }
        };

        kill_switch.set_running(false);

        match outcome {
            Ok(()) => {
                info!(component = %name, "component process exited successfully");
                Ok(())
            }
            Err(reason) => {
                info!(component = %name, reason = %reason, "component process failed");
                Err(SpawnerError::execution(name, reason))
            }
        }
    }

    /// Start a detached drain for `stream` when tee routing claims it.
    fn drain<R>(&mut self, name: &str, stream: Stream, pipe: Option<R>) -> Result<()>
    where
        R: tokio::io::AsyncRead + Unpin + Send + 'static,
    {
        if !self.tee.routes(stream) {
            return Ok(());
        }

        let pipe = pipe.ok_or_else(|| SpawnerError::Pipe {
            component: name.to_string(),
            stream,
        })?;

        let file = self.tee.writer(stream).unwrap_or_else(|| {
            Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("no open {stream} log file"),
            ))
        });
        let file = file.map_err(|source| SpawnerError::Filesystem {
            component: name.to_string(),
            path: self.prefix.join(self.log_name()),
            source,
        })?;

        self.drains.push(spawn_drain(name.to_string(), stream, pipe, file));
        Ok(())
    }

    /// Teardown: wait for outstanding output drains in this subtree, then
    /// close every log file.
    ///
    /// Drains still running after [`DRAIN_GRACE`] are aborted. This happens
    /// when a process leaves a background child holding its output pipe.
    pub async fn close(&mut self) {
        self.close_with_grace(DRAIN_GRACE).await;
    }

    /// [`Component::close`] with an explicit bound on waiting for drains.
    pub async fn close_with_grace(&mut self, grace: Duration) {
        let mut drains = Vec::new();
        self.take_drains(&mut drains);

        let deadline = Instant::now() + grace;
        for mut handle in drains {
            match tokio::time::timeout_at(deadline, &mut handle).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => warn!(error = %e, "output drain task failed"),
                Err(_) => {
                    warn!("output drain still open at teardown; aborting it");
                    handle.abort();
                }
            }
        }

        self.close_tee();
    }

    fn take_drains(&mut self, out: &mut Vec<JoinHandle<()>>) {
        for child in &mut self.before {
            child.take_drains(out);
        }
        out.append(&mut self.drains);
        for child in &mut self.after {
            child.take_drains(out);
        }
    }

    fn close_tee(&mut self) {
        for child in &mut self.before {
            child.close_tee();
        }
        self.tee.close();
        for child in &mut self.after {
            child.close_tee();
        }
    }
}
