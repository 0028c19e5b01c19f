#![allow(dead_code)]

use std::path::Path;

use spawner::component::{Component, Tee};

/// Builder for `Component` trees to simplify test setup.
pub struct ComponentBuilder {
    component: Component,
}

impl ComponentBuilder {
    /// A component with no entrypoint and the given command.
    pub fn cmd<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut component = Component::default();
        component.cmd = args.into_iter().map(Into::into).collect();
        Self { component }
    }

    /// A component running `script` through `sh -c`.
    pub fn shell(script: &str) -> Self {
        Self::cmd([script]).entrypoint(["sh", "-c"])
    }

    /// A shell component that appends `label` as one line to `trace`.
    pub fn trace(trace: &Path, label: &str) -> Self {
        Self::shell(&format!("echo {label} >> '{}'", trace.display()))
    }

    pub fn entrypoint<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.component.entrypoint = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn workdir(mut self, dir: impl AsRef<Path>) -> Self {
        self.component.workdir = dir.as_ref().to_path_buf();
        self
    }

    pub fn depends(mut self, depends: &str) -> Self {
        self.component.depends = depends.to_string();
        self
    }

    pub fn before(mut self, child: ComponentBuilder) -> Self {
        self.component.before.push(child.build());
        self
    }

    pub fn after(mut self, child: ComponentBuilder) -> Self {
        self.component.after.push(child.build());
        self
    }

    pub fn tee(mut self, stdout: bool, stderr: bool, combined: bool) -> Self {
        self.component.tee = Tee::new(stdout, stderr, combined);
        self
    }

    pub fn build(self) -> Component {
        self.component
    }
}
