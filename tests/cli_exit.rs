use std::process::{Command, Output};

fn run(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_query-logs"))
        .args(args)
        .env_remove("QUERY_LOGS_HOSTNAME")
        .env_remove("QUERY_LOGS_CLIENT_ID")
        .env_remove("QUERY_LOGS_CLIENT_SECRET")
        .output()
        .unwrap()
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[test]
fn test_missing_hostname_exits_with_3() {
    let output = run(&["-clientID", "id", "-clientSecret", "secret"]);

    assert_eq!(output.status.code(), Some(3));
    assert_eq!(
        stdout(&output).trim_end(),
        "ERROR: The tenant hostname is required. Use the -hostname flag."
    );
}

#[test]
fn test_all_required_flags_missing() {
    let output = run(&[]);

    assert_eq!(output.status.code(), Some(3));
    let out = stdout(&output);
    let lines: Vec<&str> = out.lines().collect();
    assert_eq!(
        lines,
        vec![
            "ERROR: The tenant hostname is required. Use the -hostname flag.",
            "ERROR: The client ID is required. Use the -clientID flag.",
            "ERROR: The client secret is required. Use the -clientSecret flag.",
        ]
    );
}

#[test]
fn test_malformed_filter_exits_before_any_request() {
    // The hostname is unroutable: reaching the network would fail with a token error instead.
    let output = run(&[
        "-hostname",
        "tenant.invalid",
        "-clientID",
        "id",
        "-clientSecret",
        "secret",
        "-filter",
        "a=1&b",
    ]);

    assert_eq!(output.status.code(), Some(3));
    let out = stdout(&output);
    assert!(out.starts_with("ERROR: Custom filter string is invalid"));
    assert!(!out.contains("access token"));
}

#[test]
fn test_unknown_flag_exits_with_3() {
    let output = run(&["-bogus"]);
    assert_eq!(output.status.code(), Some(3));
}

#[test]
fn test_help_exits_cleanly() {
    let output = run(&["-help"]);
    assert_eq!(output.status.code(), Some(0));
    assert!(stdout(&output).contains("-clientSecret"));
}
