//! Delivery through sendmail and SMTP stand-ins.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use muttdown_core::service::deliver;
use muttdown_core::{
    Envelope, SendmailError, SmtpError, SmtpSettings, send_with_sendmail, send_with_smtp,
};
use muttdown_smtp::Client;
use muttdown_smtp::connection::connect;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// Writes an executable shell script into a fresh temporary directory.
fn script(name: &str, body: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("muttdown-{name}-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("sendmail");
    std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}

fn command(path: &Path, extra: &[&str]) -> Vec<String> {
    std::iter::once(path.display().to_string())
        .chain(extra.iter().map(ToString::to_string))
        .collect()
}

#[tokio::test]
async fn sendmail_receives_arguments_and_message() {
    let path = script(
        "ok",
        "dir=$(dirname \"$0\")\nprintf '%s\\n' \"$@\" > \"$dir/args\"\ncat > \"$dir/message\"",
    );
    let envelope = Envelope::new("me@example.com", ["a@example.com", "b@example.com"]).unwrap();
    let message = b"Subject: hi\n\nbody\n";

    send_with_sendmail(&command(&path, &["-oi"]), &envelope, message)
        .await
        .unwrap();

    let dir = path.parent().unwrap();
    let args = std::fs::read_to_string(dir.join("args")).unwrap();
    assert_eq!(args, "-oi\n-f\nme@example.com\na@example.com\nb@example.com\n");
    assert_eq!(std::fs::read(dir.join("message")).unwrap(), message);
}

#[tokio::test]
async fn sendmail_failure_reports_status_and_stderr() {
    let path = script("fail", "cat > /dev/null\necho 'queue full' >&2\nexit 75");
    let envelope = Envelope::new("me@example.com", ["a@example.com"]).unwrap();

    let err = send_with_sendmail(&command(&path, &[]), &envelope, b"x\n")
        .await
        .unwrap_err();
    match err {
        SendmailError::Failed { status, stderr, .. } => {
            assert_eq!(status.code(), Some(75));
            assert_eq!(stderr, "queue full");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn sendmail_missing_program() {
    let envelope = Envelope::new("me@example.com", ["a@example.com"]).unwrap();
    let err = send_with_sendmail(
        &["/nonexistent/muttdown/sendmail".to_string()],
        &envelope,
        b"x\n",
    )
    .await
    .unwrap_err();
    assert!(matches!(err, SendmailError::Spawn { .. }));

    let err = send_with_sendmail(&[], &envelope, b"x\n").await.unwrap_err();
    assert!(matches!(err, SendmailError::EmptyCommand));
}

/// Minimal relay that accepts everything and records the session.
async fn relay(extensions: &'static str) -> (u16, JoinHandle<Vec<String>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    let handle = tokio::spawn(async move {
        let (socket, _) = listener.accept().await.unwrap();
        let (read_half, mut write_half) = socket.into_split();
        let mut reader = BufReader::new(read_half);
        let mut transcript = Vec::new();
        let mut in_data = false;

        write_half.write_all(b"220 relay ready\r\n").await.unwrap();
        loop {
            let mut line = String::new();
            if reader.read_line(&mut line).await.unwrap() == 0 {
                break;
            }
            let line = line.trim_end_matches("\r\n").to_string();
            transcript.push(line.clone());

            let reply = if in_data {
                if line != "." {
                    continue;
                }
                in_data = false;
                "250 queued\r\n".to_string()
            } else if line.starts_with("EHLO") {
                format!("250-relay\r\n{extensions}")
            } else if line == "DATA" {
                in_data = true;
                "354 go ahead\r\n".to_string()
            } else if line == "QUIT" {
                write_half.write_all(b"221 bye\r\n").await.unwrap();
                break;
            } else {
                "250 ok\r\n".to_string()
            };
            write_half.write_all(reply.as_bytes()).await.unwrap();
        }
        transcript
    });

    (port, handle)
}

#[tokio::test]
async fn deliver_requests_8bitmime_for_8bit_messages() {
    let (port, server) = relay("250 8BITMIME\r\n").await;
    let stream = connect("127.0.0.1", port, Some(Duration::from_secs(5)))
        .await
        .unwrap();
    let client = Client::from_stream(stream)
        .await
        .unwrap()
        .ehlo("localhost")
        .await
        .unwrap();

    let envelope = Envelope::new("me@example.com", ["a@example.com", "b@example.com"]).unwrap();
    deliver(client, &envelope, "Subject: caf\u{e9}\n\nbody\n".as_bytes())
        .await
        .unwrap();

    let transcript = server.await.unwrap();
    assert_eq!(transcript[1], "MAIL FROM:<me@example.com> BODY=8BITMIME");
    assert_eq!(transcript[2], "RCPT TO:<a@example.com>");
    assert_eq!(transcript[3], "RCPT TO:<b@example.com>");
    assert_eq!(transcript[4], "DATA");
    assert_eq!(transcript.last().map(String::as_str), Some("QUIT"));
}

#[tokio::test]
async fn deliver_plain_ascii_without_body_parameter() {
    let (port, server) = relay("250 8BITMIME\r\n").await;
    let stream = connect("127.0.0.1", port, None).await.unwrap();
    let client = Client::from_stream(stream)
        .await
        .unwrap()
        .ehlo("localhost")
        .await
        .unwrap();

    let envelope = Envelope::new("me@example.com", ["a@example.com"]).unwrap();
    deliver(client, &envelope, b"Subject: hi\n\nbody\n")
        .await
        .unwrap();

    let transcript = server.await.unwrap();
    assert_eq!(transcript[1], "MAIL FROM:<me@example.com>");
}

#[tokio::test]
async fn starttls_mode_requires_server_support() {
    let (port, _server) = relay("250 8BITMIME\r\n").await;
    let settings = SmtpSettings {
        host: "127.0.0.1".into(),
        port,
        ssl: false,
        username: String::new(),
        password: None,
        timeout: Duration::from_secs(5),
    };
    let envelope = Envelope::new("me@example.com", ["a@example.com"]).unwrap();

    let err = send_with_smtp(&settings, &envelope, b"x\n").await.unwrap_err();
    assert!(matches!(err, SmtpError::Connection(_)));
}
