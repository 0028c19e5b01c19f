// src/component/tee.rs

//! Output routing for a component process.
//!
//! `tee` decides which process streams are captured to log files:
//!
//! ```yaml
//! tee:
//!   combined: true   # stdout + stderr -> <name>.log
//! ```
//!
//! ```yaml
//! tee:
//!   stdout: true     # stdout -> <name>.log
//!   stderr: true     # stderr -> <name>.err
//! ```
//!
//! A stream that is not routed is inherited from the parent process and is
//! never piped.

use std::ffi::OsString;
use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use serde::Deserialize;
use tokio::io::{AsyncRead, AsyncWriteExt};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::errors::Stream;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Tee {
    pub stdout: bool,
    pub stderr: bool,
    pub combined: bool,

    #[serde(skip)]
    stdout_file: Option<File>,

    #[serde(skip)]
    stderr_file: Option<File>,
}

impl Tee {
    pub fn new(stdout: bool, stderr: bool, combined: bool) -> Self {
        Self {
            stdout,
            stderr,
            combined,
            ..Self::default()
        }
    }

    /// True when this stream is captured to a file.
    pub fn routes(&self, stream: Stream) -> bool {
        match stream {
            Stream::Stdout => self.combined || self.stdout,
            Stream::Stderr => self.combined || self.stderr,
        }
    }

    /// True when any stream is captured.
    pub fn is_enabled(&self) -> bool {
        self.combined || self.stdout || self.stderr
    }

    /// How the process should be wired for `stream`.
    pub fn stdio(&self, stream: Stream) -> Stdio {
        if self.routes(stream) {
            Stdio::piped()
        } else {
            Stdio::inherit()
        }
    }

    /// Open destination files next to `base`: `<base>.log` for stdout (or
    /// both streams when combined) and `<base>.err` for stderr.
    ///
    /// Returns the path that failed to open on error.
    pub fn open(&mut self, base: &Path) -> Result<(), (PathBuf, io::Error)> {
        if self.combined {
            let log = with_suffix(base, ".log");
            let file = create_log_file(&log).map_err(|e| (log.clone(), e))?;
            let dup = file.try_clone().map_err(|e| (log, e))?;
            self.stdout_file = Some(file);
            self.stderr_file = Some(dup);
            return Ok(());
        }

        if self.stdout {
            let log = with_suffix(base, ".log");
            self.stdout_file = Some(create_log_file(&log).map_err(|e| (log, e))?);
        }

        if self.stderr {
            let err = with_suffix(base, ".err");
            self.stderr_file = Some(create_log_file(&err).map_err(|e| (err, e))?);
        }

        Ok(())
    }

    /// A fresh writer handle for `stream`, if that stream has an open file.
    ///
    /// In combined mode both streams share one file description, so writes
    /// from the two drains interleave in arrival order.
    pub fn writer(&self, stream: Stream) -> Option<io::Result<File>> {
        let file = match stream {
            Stream::Stdout => self.stdout_file.as_ref(),
            Stream::Stderr => self.stderr_file.as_ref(),
        }?;
        Some(file.try_clone())
    }

    /// Close all destination files.
    pub fn close(&mut self) {
        self.stdout_file.take();
        self.stderr_file.take();
    }

    pub fn is_open(&self) -> bool {
        self.stdout_file.is_some() || self.stderr_file.is_some()
    }
}

fn with_suffix(base: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(base.as_os_str());
    name.push(suffix);
    PathBuf::from(name)
}

fn create_log_file(path: &Path) -> io::Result<File> {
    let mut opts = OpenOptions::new();
    opts.create(true).write(true).truncate(true);

    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        opts.mode(0o644);
    }

    opts.open(path)
}

/// Spawn a detached task copying `reader` into `file` until EOF.
///
/// Copy errors are logged and never reach the caller.
pub fn spawn_drain<R>(component: String, stream: Stream, mut reader: R, file: File) -> JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut writer = tokio::fs::File::from_std(file);

        let copied = async {
            let bytes = tokio::io::copy(&mut reader, &mut writer).await?;
            writer.flush().await?;
            Ok::<_, io::Error>(bytes)
        };

        match copied.await {
            Ok(bytes) => {
                debug!(component = %component, %stream, bytes, "output drained");
            }
            Err(err) => {
                warn!(component = %component, %stream, error = %err, "failed to drain output");
            }
        }
    })
}
