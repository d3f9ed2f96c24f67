use std::process::Command;

use test_support::TempTree;

fn binary_output(args: &[&str]) -> std::process::Output {
    let path = env!("CARGO_BIN_EXE_riffle");
    Command::new(path)
        .args(args)
        .output()
        .unwrap_or_else(|error| panic!("failed to run {path}: {error}"))
}

#[test]
fn riffle_help_lists_usage() {
    let output = binary_output(&["--help"]);
    assert!(output.status.success(), "--help should succeed");
    assert!(
        output.stderr.is_empty(),
        "help output should not write to stderr"
    );
    let stdout = String::from_utf8(output.stdout).expect("stdout is UTF-8");
    assert!(stdout.contains("Usage:"));
    assert!(stdout.contains("riffle"));
}

#[test]
fn riffle_without_operands_shows_usage() {
    let output = binary_output(&[]);
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8(output.stderr).expect("stderr is UTF-8");
    assert!(stderr.contains("Usage:"));
}

#[test]
fn riffle_walks_a_tree_both_ways() {
    let tree = TempTree::with(&["docs/a.md", "docs/guide/b.md", "docs/c.md"]).expect("tree");
    let root = tree.join("docs");

    assert_cmd::Command::new(env!("CARGO_BIN_EXE_riffle"))
        .arg(&root)
        .assert()
        .success()
        .stdout("docs/a.md\ndocs/c.md\ndocs/guide/b.md\n");

    assert_cmd::Command::new(env!("CARGO_BIN_EXE_riffle"))
        .arg("--reverse")
        .arg(&root)
        .assert()
        .success()
        .stdout("docs/guide/b.md\ndocs/c.md\ndocs/a.md\n");
}

#[test]
fn riffle_reports_unreadable_roots_with_exit_code_two() {
    let tree = TempTree::with(&["real/"]).expect("tree");
    #[cfg(unix)]
    {
        tree.symlink("real", "link").expect("symlink");
        let output = binary_output(&[tree.join("link").to_str().expect("UTF-8 path")]);
        assert_eq!(output.status.code(), Some(2));
    }
    #[cfg(not(unix))]
    {
        let output = binary_output(&[tree.join("real").to_str().expect("UTF-8 path")]);
        assert!(output.status.success());
    }
}
