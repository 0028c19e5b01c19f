// src/component/template.rs

//! Argument template expansion.
//!
//! Each argument is compiled as a `minijinja` template and rendered against
//! the component's own fields:
//!
//! ```yaml
//! entrypoint: ["sh", "-c"]
//! cmd: ["echo running in {{ workdir }}"]
//! ```
//!
//! Only `{{ ... }}` is template syntax in ordinary arguments. Blocks and
//! comments use `<<% ... %>>` and `<<# ... #>>`, so shell text such as
//! `${#x}` or `printf '{%s}'` passes through unchanged. Trailing newlines are
//! kept.
//!
//! A template that does not compile aborts the whole expansion. A template
//! that compiles but fails to render (e.g. `{{ no_such_field }}`) keeps its
//! literal text; the remaining arguments are still expanded.

use std::path::Path;

use minijinja::syntax::SyntaxConfig;
use minijinja::{Environment, UndefinedBehavior, Value};
use serde::Serialize;
use tracing::debug;

use super::Component;

/// Fields of a component visible to argument templates.
#[derive(Debug, Serialize)]
struct TemplateContext<'a> {
    entrypoint: &'a [String],
    cmd: &'a [String],
    depends: &'a str,
    workdir: &'a Path,
    prefix: &'a Path,
}

impl<'a> From<&'a Component> for TemplateContext<'a> {
    fn from(component: &'a Component) -> Self {
        Self {
            entrypoint: &component.entrypoint,
            cmd: &component.cmd,
            depends: &component.depends,
            workdir: &component.workdir,
            prefix: component.prefix(),
        }
    }
}

/// Expand every element of `args` against `component`.
pub fn expand_args(
    component: &Component,
    args: Vec<String>,
) -> Result<Vec<String>, minijinja::Error> {
    let ctx = Value::from_serialize(TemplateContext::from(component));
    let env = environment()?;

    args.iter().map(|arg| expand_one(&env, &ctx, arg)).collect()
}

fn environment<'s>() -> Result<Environment<'s>, minijinja::Error> {
    let mut env = Environment::new();
    env.set_syntax(
        SyntaxConfig::builder()
            .block_delimiters("<<%", "%>>")
            .comment_delimiters("<<#", "#>>")
            .build()?,
    );
    env.set_undefined_behavior(UndefinedBehavior::Strict);
    env.set_keep_trailing_newline(true);
    Ok(env)
}

fn expand_one<'s>(
    env: &Environment<'s>,
    ctx: &Value,
    arg: &'s str,
) -> Result<String, minijinja::Error> {
    let tmpl = env.template_from_str(arg)?;

    match tmpl.render(ctx) {
        Ok(rendered) => Ok(rendered),
        Err(err) => {
            debug!(arg = %arg, error = %err, "template evaluation failed; keeping literal");
            Ok(arg.to_string())
        }
    }
}
