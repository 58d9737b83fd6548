//! Full client sessions against a scripted loopback server.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use muttdown_smtp::connection::connect;
use muttdown_smtp::{Address, BodyType, Client, Error};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// Canned EHLO reply advertising the given extension lines.
fn ehlo_reply(extensions: &[&str]) -> String {
    let mut reply = String::from("250-mock.example.com greets you\r\n");
    for (i, ext) in extensions.iter().enumerate() {
        let sep = if i + 1 == extensions.len() { ' ' } else { '-' };
        reply.push_str(&format!("250{sep}{ext}\r\n"));
    }
    reply
}

/// Runs a minimal SMTP server and returns everything the client sent.
async fn mock_server(
    extensions: &'static [&'static str],
    reject_rcpt: bool,
) -> (u16, JoinHandle<Vec<String>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    let handle = tokio::spawn(async move {
        let (socket, _) = listener.accept().await.unwrap();
        let (read_half, mut write_half) = socket.into_split();
        let mut reader = BufReader::new(read_half);
        let mut transcript = Vec::new();
        let mut in_data = false;
        let mut login_step = 0;

        write_half
            .write_all(b"220 mock.example.com ESMTP ready\r\n")
            .await
            .unwrap();

        loop {
            let mut line = String::new();
            if reader.read_line(&mut line).await.unwrap() == 0 {
                break;
            }
            let line = line.trim_end_matches("\r\n").to_string();
            transcript.push(line.clone());

            if in_data {
                if line == "." {
                    in_data = false;
                    write_half.write_all(b"250 2.0.0 queued\r\n").await.unwrap();
                }
                continue;
            }

            if login_step > 0 {
                login_step += 1;
                let reply: &[u8] = if login_step == 2 {
                    b"334 UGFzc3dvcmQ6\r\n"
                } else {
                    login_step = 0;
                    b"235 ok\r\n"
                };
                write_half.write_all(reply).await.unwrap();
                continue;
            }

            let reply = match line.split_whitespace().next().unwrap_or_default() {
                "EHLO" => ehlo_reply(extensions),
                "AUTH" if line == "AUTH LOGIN" => {
                    login_step = 1;
                    "334 VXNlcm5hbWU6\r\n".to_string()
                }
                "AUTH" => "235 2.7.0 Authentication successful\r\n".to_string(),
                "MAIL" => "250 2.1.0 Ok\r\n".to_string(),
                "RCPT" if reject_rcpt => "550 5.1.1 No such user\r\n".to_string(),
                "RCPT" => "250 2.1.5 Ok\r\n".to_string(),
                "DATA" => {
                    in_data = true;
                    "354 End data with <CR><LF>.<CR><LF>\r\n".to_string()
                }
                "QUIT" => {
                    write_half.write_all(b"221 2.0.0 Bye\r\n").await.unwrap();
                    break;
                }
                _ => "502 5.5.2 Error: command not recognized\r\n".to_string(),
            };
            write_half.write_all(reply.as_bytes()).await.unwrap();
        }

        transcript
    });

    (port, handle)
}

#[tokio::test]
async fn plain_auth_session_delivers_message() {
    let (port, server) =
        mock_server(&["8BITMIME", "AUTH PLAIN LOGIN", "SIZE 1000000"], false).await;

    let stream = connect("127.0.0.1", port, Some(Duration::from_secs(5)))
        .await
        .unwrap();
    let client = Client::from_stream(stream).await.unwrap();
    assert_eq!(client.server_info().hostname, "mock.example.com");

    let client = client.ehlo("localhost").await.unwrap();
    assert!(client.server_info().supports_8bitmime());
    assert_eq!(client.server_info().max_message_size(), Some(1_000_000));

    let client = client.auth("user", "secret").await.unwrap();
    let client = client
        .mail_from(Address::new("me@example.com").unwrap(), Some(BodyType::EightBitMime))
        .await
        .unwrap();
    let client = client
        .rcpt_to(Address::new("a@example.com").unwrap())
        .await
        .unwrap()
        .rcpt_to(Address::new("b@example.com").unwrap())
        .await
        .unwrap();
    let client = client.data().await.unwrap();
    let client = client
        .send_message(b"Subject: hi\n\n.leading dot\nlast\n")
        .await
        .unwrap();
    client.quit().await.unwrap();

    let transcript = server.await.unwrap();
    assert_eq!(
        transcript,
        vec![
            "EHLO localhost",
            "AUTH PLAIN AHVzZXIAc2VjcmV0",
            "MAIL FROM:<me@example.com> BODY=8BITMIME",
            "RCPT TO:<a@example.com>",
            "RCPT TO:<b@example.com>",
            "DATA",
            "Subject: hi",
            "",
            "..leading dot",
            "last",
            ".",
            "QUIT",
        ]
    );
}

#[tokio::test]
async fn login_auth_used_when_plain_is_missing() {
    let (port, server) = mock_server(&["AUTH LOGIN"], false).await;

    let stream = connect("127.0.0.1", port, None).await.unwrap();
    let client = Client::from_stream(stream)
        .await
        .unwrap()
        .ehlo("localhost")
        .await
        .unwrap();
    let client = client.auth("user", "secret").await.unwrap();
    client.quit().await.unwrap();

    let transcript = server.await.unwrap();
    assert_eq!(
        transcript,
        vec!["EHLO localhost", "AUTH LOGIN", "dXNlcg==", "c2VjcmV0", "QUIT"]
    );
}

#[tokio::test]
async fn rejected_recipient_is_an_error() {
    let (port, server) = mock_server(&["PIPELINING"], true).await;

    let stream = connect("127.0.0.1", port, None).await.unwrap();
    let client = Client::from_stream(stream)
        .await
        .unwrap()
        .ehlo("localhost")
        .await
        .unwrap();
    let client = client
        .mail_from(Address::new("me@example.com").unwrap(), None)
        .await
        .unwrap();
    let err = client
        .rcpt_to(Address::new("nobody@example.com").unwrap())
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Rejected { code: 550, .. }));
    assert!(err.is_permanent());
    drop(server);
}

#[tokio::test]
async fn auth_without_advertised_mechanism_fails() {
    let (port, _server) = mock_server(&["8BITMIME"], false).await;

    let stream = connect("127.0.0.1", port, None).await.unwrap();
    let client = Client::from_stream(stream)
        .await
        .unwrap()
        .ehlo("localhost")
        .await
        .unwrap();
    assert!(matches!(
        client.auth("user", "secret").await,
        Err(Error::NotSupported(_))
    ));
}

#[tokio::test]
async fn starttls_requires_advertisement() {
    let (port, _server) = mock_server(&["8BITMIME"], false).await;

    let stream = connect("127.0.0.1", port, None).await.unwrap();
    let client = Client::from_stream(stream)
        .await
        .unwrap()
        .ehlo("localhost")
        .await
        .unwrap();
    assert!(matches!(
        client.starttls("127.0.0.1").await,
        Err(Error::NotSupported(_))
    ));
}
