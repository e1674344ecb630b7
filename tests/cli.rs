use assert_cmd::Command;

#[test]
fn help_lists_the_practice_flags() {
    let output = Command::cargo_bin("spelldrill")
        .unwrap()
        .arg("--help")
        .output()
        .unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    for flag in ["--words", "--time-limit", "--paper", "--validator-url"] {
        assert!(stdout.contains(flag), "missing {flag} in help");
    }
}

#[test]
fn zero_time_limit_is_rejected() {
    Command::cargo_bin("spelldrill")
        .unwrap()
        .args(["--time-limit", "0"])
        .assert()
        .failure()
        .code(2);
}

#[test]
fn non_numeric_count_is_rejected() {
    Command::cargo_bin("spelldrill")
        .unwrap()
        .args(["--count", "many"])
        .assert()
        .failure()
        .code(2);
}

#[test]
fn refuses_to_run_without_a_terminal() {
    let output = Command::cargo_bin("spelldrill")
        .unwrap()
        .args(["--words", "cat"])
        .write_stdin("")
        .output()
        .unwrap();

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("stdin must be a tty"));
}
