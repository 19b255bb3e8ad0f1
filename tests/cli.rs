// tests/cli.rs

use std::process::Command;

fn argfan(args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_argfan"))
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .unwrap()
}

#[test]
fn test_limit_without_parallel_warns_on_stderr() {
    let output = argfan(&["/limit-2", "/list", "echo", "hi"]);
    assert!(output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("/limit has no effect without /parallel"));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("echo hi"));
}

#[test]
fn test_quiet_flag_silences_the_warning() {
    let output = argfan(&["/quiet", "/limit-2", "/list", "echo", "hi"]);
    assert!(output.status.success());
    assert!(!String::from_utf8_lossy(&output.stderr).contains("/limit"));
}

#[test]
fn test_template_error_exits_with_one() {
    let output = argfan(&["/list", "/crossjoin", "/repeat-2", "/iapply-a", "echo"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Conflicting options"));
}
