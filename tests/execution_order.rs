// tests/execution_order.rs

#![cfg(unix)]

use std::error::Error;
use std::fs;
use std::path::Path;

use tokio_util::sync::CancellationToken;

use spawner::errors::{ExecutionFailure, SpawnerError};
use spawner_test_utils::{ComponentBuilder, init_tracing, with_timeout};

type TestResult = Result<(), Box<dyn Error>>;

fn read_trace(path: &Path) -> Vec<String> {
    fs::read_to_string(path)
        .unwrap_or_default()
        .lines()
        .map(str::to_string)
        .collect()
}

#[tokio::test]
async fn before_self_after_runs_in_order() -> TestResult {
    init_tracing();
    let dir = tempfile::tempdir()?;
    let trace = dir.path().join("trace.txt");

    let mut root = ComponentBuilder::trace(&trace, "A")
        .before(ComponentBuilder::trace(&trace, "B"))
        .after(ComponentBuilder::trace(&trace, "C"))
        .build();

    root.add_prefix(dir.path());
    root.populate()?;

    let cancel = CancellationToken::new();
    with_timeout(root.exec(&cancel)).await?;
    root.close().await;

    assert_eq!(read_trace(&trace), vec!["B", "A", "C"]);
    Ok(())
}

#[tokio::test]
async fn nested_subtrees_run_depth_first() -> TestResult {
    init_tracing();
    let dir = tempfile::tempdir()?;
    let trace = dir.path().join("trace.txt");
    let t = |label: &str| ComponentBuilder::trace(&trace, label);

    let mut root = t("root")
        .before(t("b0").before(t("b0.b")).after(t("b0.a")))
        .before(t("b1"))
        .after(t("a0").before(t("a0.b")))
        .after(t("a1").after(t("a1.a")))
        .build();

    root.add_prefix(dir.path());

    let cancel = CancellationToken::new();
    with_timeout(root.exec(&cancel)).await?;
    root.close().await;

    assert_eq!(
        read_trace(&trace),
        vec!["b0.b", "b0", "b0.a", "b1", "root", "a0.b", "a0", "a1", "a1.a"]
    );
    Ok(())
}

#[tokio::test]
async fn siblings_never_overlap() -> TestResult {
    init_tracing();
    let dir = tempfile::tempdir()?;
    let trace = dir.path().join("trace.txt");
    let step = |label: &str| {
        ComponentBuilder::shell(&format!(
            "echo start-{label} >> '{t}'; sleep 0.1; echo end-{label} >> '{t}'",
            t = trace.display()
        ))
    };

    let mut root = step("self")
        .before(step("x"))
        .before(step("y"))
        .after(step("z"))
        .build();

    root.add_prefix(dir.path());

    let cancel = CancellationToken::new();
    with_timeout(root.exec(&cancel)).await?;
    root.close().await;

    assert_eq!(
        read_trace(&trace),
        vec![
            "start-x", "end-x", "start-y", "end-y", "start-self", "end-self", "start-z",
            "end-z"
        ]
    );
    Ok(())
}

#[tokio::test]
async fn failing_before_child_stops_remaining_plan() -> TestResult {
    init_tracing();
    let dir = tempfile::tempdir()?;
    let trace = dir.path().join("trace.txt");

    let mut root = ComponentBuilder::trace(&trace, "self")
        .before(ComponentBuilder::trace(&trace, "first"))
        .before(ComponentBuilder::shell("exit 3"))
        .before(ComponentBuilder::trace(&trace, "third"))
        .after(ComponentBuilder::trace(&trace, "after"))
        .build();

    root.add_prefix(dir.path());
    root.populate()?;

    let cancel = CancellationToken::new();
    let err = with_timeout(root.exec(&cancel))
        .await
        .expect_err("failing before child must fail the tree");
    root.close().await;

    match err {
        SpawnerError::Execution { component, reason } => {
            assert_eq!(component, "sh -c exit 3");
            assert!(matches!(reason, ExecutionFailure::Exit(status) if status.code() == Some(3)));
        }
        other => panic!("expected execution error, got {other:?}"),
    }

    assert_eq!(read_trace(&trace), vec!["first"]);
    Ok(())
}

#[tokio::test]
async fn failing_self_skips_after_children() -> TestResult {
    init_tracing();
    let dir = tempfile::tempdir()?;
    let trace = dir.path().join("trace.txt");

    let mut root = ComponentBuilder::shell(&format!("echo self >> '{}'; false", trace.display()))
        .before(ComponentBuilder::trace(&trace, "before"))
        .after(ComponentBuilder::trace(&trace, "after"))
        .build();

    root.add_prefix(dir.path());

    let cancel = CancellationToken::new();
    let result = with_timeout(root.exec(&cancel)).await;
    root.close().await;

    let err = result.expect_err("failing process must fail the tree");
    assert!(err.to_string().starts_with("execution of sh -c echo self"));
    assert!(err.to_string().contains("reason: exit status: 1"));
    assert_eq!(read_trace(&trace), vec!["before", "self"]);
    Ok(())
}

#[tokio::test]
async fn failing_after_child_is_propagated() -> TestResult {
    init_tracing();
    let dir = tempfile::tempdir()?;
    let trace = dir.path().join("trace.txt");

    let mut root = ComponentBuilder::trace(&trace, "self")
        .after(ComponentBuilder::shell("exit 7"))
        .after(ComponentBuilder::trace(&trace, "never"))
        .build();

    root.add_prefix(dir.path());

    let cancel = CancellationToken::new();
    let result = with_timeout(root.exec(&cancel)).await;
    root.close().await;

    assert!(matches!(
        result,
        Err(SpawnerError::Execution { ref component, .. }) if component == "sh -c exit 7"
    ));
    assert_eq!(read_trace(&trace), vec!["self"]);
    Ok(())
}

#[tokio::test]
async fn missing_program_is_a_start_error() -> TestResult {
    init_tracing();
    let dir = tempfile::tempdir()?;
    let trace = dir.path().join("trace.txt");

    let mut root = ComponentBuilder::cmd(["spawner-test-no-such-program"])
        .after(ComponentBuilder::trace(&trace, "after"))
        .build();

    root.add_prefix(dir.path());

    let cancel = CancellationToken::new();
    let result = with_timeout(root.exec(&cancel)).await;

    assert!(matches!(
        result,
        Err(SpawnerError::Execution {
            reason: ExecutionFailure::Start(_),
            ..
        })
    ));
    assert!(!trace.exists());
    Ok(())
}

#[tokio::test]
async fn processes_run_in_their_workdir() -> TestResult {
    init_tracing();
    let dir = tempfile::tempdir()?;

    let mut root = ComponentBuilder::shell("pwd > where.txt")
        .workdir("nested/deeper")
        .build();

    root.add_prefix(dir.path());

    let cancel = CancellationToken::new();
    with_timeout(root.exec(&cancel)).await?;
    root.close().await;

    let expected = dir.path().join("nested/deeper").canonicalize()?;
    let recorded = fs::read_to_string(expected.join("where.txt"))?;
    assert_eq!(Path::new(recorded.trim()).canonicalize()?, expected);
    Ok(())
}
