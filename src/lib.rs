// src/lib.rs

pub mod cli;
pub mod component;
pub mod config;
pub mod errors;
pub mod logging;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::cli::CliArgs;
use crate::component::Component;
use crate::config::load_and_validate;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - loading + validating the component tree
/// - prefixing and population
/// - execution, with Ctrl-C mapped to cancellation + cascading kill
/// - teardown of drains and log files
pub async fn run(args: CliArgs) -> Result<()> {
    let mut root = load_and_validate(&args.config)
        .with_context(|| format!("loading component tree from {:?}", args.config))?;

    if args.dry_run {
        print_dry_run(&root);
        return Ok(());
    }

    let prefix = args
        .prefix
        .clone()
        .unwrap_or_else(|| config_root_dir(&args.config));
    info!(prefix = %prefix.display(), root = %root, "running component tree");

    root.add_prefix(&prefix);
    root.populate()?;

    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        let kill = root.kill_handle();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "failed to listen for Ctrl+C");
                return;
            }
            info!("interrupt received; killing component tree");
            cancel.cancel();
            kill.kill();
        });
    }

    let result = root.exec(&cancel).await;
    root.close().await;

    result?;
    info!("component tree finished successfully");
    Ok(())
}

/// Directory the config file lives in, used as the default prefix.
///
/// A bare file name like `spawner.yaml` yields `.`.
fn config_root_dir(config_path: &Path) -> PathBuf {
    match config_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

fn print_dry_run(root: &Component) {
    println!("spawner dry-run: execution order");
    print_node(root, 0);
}

fn print_node(node: &Component, depth: usize) {
    let indent = "  ".repeat(depth);

    for child in &node.before {
        print_node(child, depth + 1);
    }

    println!("{indent}- {node}");
    if !node.workdir.as_os_str().is_empty() {
        println!("{indent}    workdir: {}", node.workdir.display());
    }
    if !node.depends.is_empty() {
        println!("{indent}    depends: {}", node.depends);
    }
    if node.tee.is_enabled() {
        println!(
            "{indent}    tee: stdout={} stderr={} combined={}",
            node.tee.stdout, node.tee.stderr, node.tee.combined
        );
    }

    for child in &node.after {
        print_node(child, depth + 1);
    }
}
