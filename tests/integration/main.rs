//! Uses the single integration test approach.
//!
//! This improves parallelism when running the tests, and reduces the number of binaries that have to be built (and linked)

mod bot;

use std::process::Stdio;

use common::{linkwatch_command, wait_for_exit};

#[tokio::test]
async fn test_run_without_token_fails() {
    let mut child = linkwatch_command(&["run", "--chat-id", "42"])
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .expect("failed to start linkwatch");
    let status = wait_for_exit(&mut child, 5).await;
    assert!(!status.success(), "missing token must be fatal");
}

#[tokio::test]
async fn test_run_with_zero_chat_id_fails() {
    let mut child = linkwatch_command(&["run", "--bot-token", "t", "--chat-id", "0"])
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .expect("failed to start linkwatch");
    let status = wait_for_exit(&mut child, 5).await;
    assert!(!status.success(), "chat id 0 counts as unset");
}

#[tokio::test]
async fn test_run_with_missing_devices_file_fails() {
    let missing = std::env::temp_dir().join("linkwatch_integration_missing_devices.toml");
    let mut child = linkwatch_command(&[
        "run",
        "--bot-token",
        "t",
        "--chat-id",
        "42",
        "--devices",
        missing.to_str().unwrap(),
    ])
    .stdout(Stdio::null())
    .stderr(Stdio::null())
    .spawn()
    .expect("failed to start linkwatch");
    let status = wait_for_exit(&mut child, 5).await;
    assert!(!status.success(), "unreadable devices file must be fatal");
}

#[tokio::test]
async fn test_sweep_prints_one_line_per_device() {
    let devices = std::env::temp_dir().join("linkwatch_integration_sweep_devices.toml");
    std::fs::write(
        &devices,
        r#"
        [[devices]]
        address = "127.0.0.1"
        label = "Loopback"

        [[devices]]
        address = "192.0.2.1"
        label = "Documentation"
        "#,
    )
    .expect("failed to write devices file");

    let output = linkwatch_command(&[
        "sweep",
        "--probe-timeout",
        "1",
        "--devices",
        devices.to_str().unwrap(),
    ])
    .output()
    .expect("failed to run linkwatch sweep");

    assert!(output.status.success(), "sweep exits cleanly");
    let stdout = String::from_utf8(output.stdout).expect("utf-8 output");
    let lines: Vec<_> = stdout.lines().collect();
    assert_eq!(lines.len(), 2, "one line per device: {stdout}");
    assert!(lines[0].ends_with("Loopback (127.0.0.1)"), "got {}", lines[0]);
    assert!(lines[1].ends_with("Documentation (192.0.2.1)"), "got {}", lines[1]);
    // TEST-NET-1 is never reachable
    assert!(lines[1].starts_with('❌'), "got {}", lines[1]);
}

#[tokio::test]
async fn test_sweep_keeps_logs_off_stdout() {
    let devices = std::env::temp_dir().join("linkwatch_integration_sweep_logs_devices.toml");
    std::fs::write(
        &devices,
        r#"
        [[devices]]
        address = "127.0.0.1"
        label = "Loopback"
        "#,
    )
    .expect("failed to write devices file");

    let output = linkwatch_command(&[
        "sweep",
        "--probe-timeout",
        "1",
        "--devices",
        devices.to_str().unwrap(),
    ])
    .env_remove("LINKWATCH_INTEGRATION_TEST")
    .env("RUST_LOG", "debug")
    .output()
    .expect("failed to run linkwatch sweep");

    assert!(output.status.success(), "sweep exits cleanly");
    let stdout = String::from_utf8(output.stdout).expect("utf-8 output");
    let lines: Vec<_> = stdout.lines().collect();
    assert_eq!(lines.len(), 1, "only device lines on stdout: {stdout}");
    assert!(lines[0].ends_with("Loopback (127.0.0.1)"), "got {}", lines[0]);
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Loaded 1 devices"), "logs go to stderr: {stderr}");
}
