//! End-to-end tests of the `run` command against a fake Bot API.

use std::process::Stdio;

use serde_json::json;

use crate::common::{
    KillOnDrop, TOKEN, linkwatch_command, spawn_fake_bot_api, wait_for_exit, wait_until,
};

#[tokio::test]
async fn test_start_command_is_answered_in_private_chat() {
    let (addr, received) = spawn_fake_bot_api(json!([
        {"update_id": 41, "message": {"message_id": 1, "text": "/start", "chat": {"id": -100, "type": "group"}}},
        {"update_id": 42, "message": {"message_id": 2, "text": "/start", "chat": {"id": 77, "type": "private"}}}
    ]))
    .await;

    let child = linkwatch_command(&[
        "run",
        "--bot-token",
        TOKEN,
        "--chat-id",
        "1",
        "--target",
        "127.0.0.1",
        "--api-url",
        &format!("http://{addr}"),
    ])
    .stdout(Stdio::null())
    .stderr(Stdio::null())
    .spawn()
    .expect("failed to start linkwatch");
    let _guard = KillOnDrop(child);

    let replied = wait_until(10, || {
        received
            .lock()
            .unwrap()
            .iter()
            .any(|(method, _)| method == "sendMessage")
    })
    .await;
    assert!(replied, "expected a reply to /start");

    // let the listener acknowledge the batch with its next poll
    let acknowledged = wait_until(10, || {
        received
            .lock()
            .unwrap()
            .iter()
            .any(|(method, body)| method == "getUpdates" && body["offset"] == 43)
    })
    .await;
    assert!(acknowledged, "cursor must move past the last update");

    let received = received.lock().unwrap().clone();
    let replies: Vec<_> = received
        .iter()
        .filter(|&(method, _)| method == "sendMessage")
        .map(|(_, body)| body)
        .collect();
    assert_eq!(replies.len(), 1, "only the private chat gets an answer");
    assert_eq!(replies[0]["chat_id"], 77);
    assert_eq!(replies[0]["parse_mode"], "HTML");
    assert!(
        replies[0]["text"].as_str().unwrap().contains("/ping"),
        "help lists the commands"
    );
    let first_poll = received
        .iter()
        .find(|&(method, _)| method == "getUpdates")
        .map(|(_, body)| body)
        .unwrap();
    assert!(first_poll.get("offset").is_none(), "first poll starts from now");
}

#[cfg(unix)]
#[tokio::test]
async fn test_sigterm_stops_gracefully() {
    let (addr, received) = spawn_fake_bot_api(json!([])).await;

    let child = linkwatch_command(&[
        "run",
        "--bot-token",
        TOKEN,
        "--chat-id",
        "1",
        "--target",
        "127.0.0.1",
        "--api-url",
        &format!("http://{addr}"),
    ])
    .stdout(Stdio::null())
    .stderr(Stdio::null())
    .spawn()
    .expect("failed to start linkwatch");
    let mut guard = KillOnDrop(child);

    let polling = wait_until(10, || !received.lock().unwrap().is_empty()).await;
    assert!(polling, "listener should poll the fake API");

    let status = std::process::Command::new("kill")
        .args(["-TERM", &guard.0.id().to_string()])
        .status()
        .expect("failed to run kill");
    assert!(status.success(), "kill -TERM failed");

    let exit = wait_for_exit(&mut guard.0, 10).await;
    assert!(exit.success(), "graceful shutdown exits with 0, got {exit:?}");
}

#[tokio::test]
async fn test_environment_alone_starts_the_daemon() {
    let (addr, received) = spawn_fake_bot_api(json!([])).await;

    let child = linkwatch_command(&[])
        .env("TG_BOTADMIN_TOKEN", TOKEN)
        .env("TG_CHAT_ID_BOTADMIN", "1")
        .env("LINKWATCH_TARGET", "127.0.0.1")
        .env("LINKWATCH_API_URL", format!("http://{addr}"))
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .expect("failed to start linkwatch");
    let _guard = KillOnDrop(child);

    let polling = wait_until(10, || {
        received
            .lock()
            .unwrap()
            .iter()
            .any(|(method, _)| method == "getUpdates")
    })
    .await;
    assert!(polling, "no subcommand runs the daemon");
}
