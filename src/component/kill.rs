// src/component/kill.rs

//! Cascading, best-effort kill.
//!
//! Every component owns a [`KillSwitch`]. While the component's process is
//! running, `exec` waits on the switch alongside the process; tripping it
//! makes `exec` kill the process. Tripping a switch with no running process
//! is a logged no-op, so killing a tree that never started (or already
//! finished) is always safe.
//!
//! [`KillHandle`] mirrors the tree's switches so a kill can be issued while
//! `exec` holds the tree mutably (e.g. from a Ctrl-C handler).

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::Notify;
use tokio::sync::futures::Notified;
use tracing::{debug, info};

use super::Component;

#[derive(Debug, Default)]
struct KillSwitchInner {
    notify: Notify,
    running: AtomicBool,
}

/// Per-component kill signal shared between `exec` and kill handles.
#[derive(Debug, Clone, Default)]
pub struct KillSwitch {
    inner: Arc<KillSwitchInner>,
}

impl KillSwitch {
    /// Future resolved by the next [`KillSwitch::trip`].
    ///
    /// Registration happens on creation, so create it before the process is
    /// started to not miss a trip issued in between.
    pub(crate) fn tripped(&self) -> Notified<'_> {
        self.inner.notify.notified()
    }

    pub(crate) fn set_running(&self, running: bool) {
        self.inner.running.store(running, Ordering::SeqCst);
    }

    pub fn is_running(&self) -> bool {
        self.inner.running.load(Ordering::SeqCst)
    }

    /// Ask the owning `exec` to kill its process, if one is running.
    ///
    /// Waiters are always notified; only a registered `exec` reacts, so a
    /// switch with no process behind it stays a no-op.
    pub fn trip(&self, component: &str) {
        if self.is_running() {
            info!(component = %component, "killing component process");
        } else {
            debug!(component = %component, "kill requested but no process is running");
        }
        self.inner.notify.notify_waiters();
    }
}

/// Detached mirror of a component tree's kill switches.
#[derive(Debug, Clone)]
pub struct KillHandle {
    component: String,
    switch: KillSwitch,
    before: Vec<KillHandle>,
    after: Vec<KillHandle>,
}

impl KillHandle {
    /// True while this component's own process is starting or running.
    pub fn is_running(&self) -> bool {
        self.switch.is_running()
    }

    /// Kill `before` subtrees, then this component, then `after` subtrees.
    pub fn kill(&self) {
        for child in &self.before {
            child.kill();
        }

        self.switch.trip(&self.component);

        for child in &self.after {
            child.kill();
        }
    }
}

impl Component {
    /// Cascading kill of this subtree: before, self, after.
    ///
    /// Best-effort: nothing is returned, failures are logged.
    pub fn kill(&self) {
        for child in &self.before {
            child.kill();
        }

        self.kill_switch.trip(&self.display_name());

        for child in &self.after {
            child.kill();
        }
    }

    /// Snapshot of this subtree's kill switches, usable concurrently with
    /// [`Component::exec`].
    pub fn kill_handle(&self) -> KillHandle {
        KillHandle {
            component: self.display_name(),
            switch: self.kill_switch.clone(),
            before: self.before.iter().map(Component::kill_handle).collect(),
            after: self.after.iter().map(Component::kill_handle).collect(),
        }
    }
}
