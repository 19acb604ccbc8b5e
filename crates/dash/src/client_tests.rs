// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::time::Duration;

use serde_json::json;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, UnixListener};
use tokio::sync::mpsc;
use yare::parameterized;

use super::*;

#[parameterized(
    host_and_port = { "example.com:9000", Target::Tcp { host: "example.com".into(), port: 9000 } },
    bare_host = { "localhost", Target::Tcp { host: "localhost".into(), port: 8100 } },
    ipv4 = { "127.0.0.1:8101", Target::Tcp { host: "127.0.0.1".into(), port: 8101 } },
    bracketed_ipv6 = { "[::1]:9000", Target::Tcp { host: "[::1]".into(), port: 9000 } },
    bracketed_ipv6_default = { "[::1]", Target::Tcp { host: "[::1]".into(), port: 8100 } },
    unix = { "unix:/tmp/stats.sock", Target::Unix(PathBuf::from("/tmp/stats.sock")) },
)]
fn target_parses(input: &str, expected: Target) {
    assert_eq!(Target::parse(input).unwrap(), expected);
}

#[parameterized(
    empty = { "" },
    empty_unix = { "unix:" },
    bad_port = { "host:port" },
    port_out_of_range = { "host:70000" },
    missing_host = { ":8100" },
    bare_ipv6 = { "::1" },
    bare_ipv6_with_port = { "fe80::1:8100" },
)]
fn target_rejects(input: &str) {
    assert!(matches!(Target::parse(input), Err(DashError::InvalidTarget(_))));
}

#[test]
fn target_displays_round_trip() {
    for s in ["example.com:9000", "unix:/tmp/stats.sock"] {
        assert_eq!(Target::parse(s).unwrap().to_string(), s);
    }
}

/// Serves canned replies, one per request line, and reports each request.
async fn tcp_server(replies: Vec<&'static str>) -> (Target, mpsc::UnboundedReceiver<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let (tx, rx) = mpsc::unbounded_channel();
    tokio::spawn(async move {
        let mut replies = replies.into_iter();
        loop {
            let Ok((stream, _)) = listener.accept().await else { return };
            let (read, mut write) = stream.into_split();
            let mut lines = BufReader::new(read);
            loop {
                let mut request = String::new();
                if lines.read_line(&mut request).await.unwrap_or(0) == 0 {
                    break;
                }
                let _ = tx.send(request);
                match replies.next() {
                    Some("<close>") => break,
                    Some("<silent>") => {}
                    Some(reply) => {
                        let _ = write.write_all(format!("{reply}\r\n").as_bytes()).await;
                    }
                    None => return,
                }
            }
        }
    });
    (Target::Tcp { host: "127.0.0.1".into(), port }, rx)
}

#[tokio::test]
async fn poll_returns_decoded_reply() {
    let (target, mut requests) = tcp_server(vec![r#"{"jobcount":7}"#]).await;
    let mut client = MonitorClient::new(target);

    let data = client.poll(&["jobcount".to_string()]).await;

    assert_eq!(Value::Object(data), json!({"jobcount": 7}));
    assert_eq!(requests.recv().await.unwrap(), "[\"jobcount\"]\r\n");
    assert!(client.is_connected());
}

#[tokio::test]
async fn poll_dedupes_names_in_first_seen_order() {
    let (target, mut requests) = tcp_server(vec![r#"{"b":1,"a":2}"#]).await;
    let mut client = MonitorClient::new(target);

    let names = ["b", "a", "b", "a"].map(String::from);
    client.poll(&names).await;

    assert_eq!(requests.recv().await.unwrap(), "[\"b\",\"a\"]\r\n");
}

#[tokio::test]
async fn poll_with_no_names_sends_nothing() {
    let (target, mut requests) = tcp_server(vec![]).await;
    let mut client = MonitorClient::new(target);

    assert!(client.poll(&[]).await.is_empty());
    assert!(!client.is_connected());
    assert!(requests.try_recv().is_err());
}

#[tokio::test]
async fn non_object_reply_is_empty_and_reconnects() {
    let (target, _requests) = tcp_server(vec!["\"BAD\"", r#"{"slots":{}}"#]).await;
    let mut client = MonitorClient::new(target);

    assert!(client.poll(&["slots".to_string()]).await.is_empty());
    assert!(!client.is_connected());

    // The server moved on to its next connection; the client reconnects.
    let data = client.poll(&["slots".to_string()]).await;
    assert_eq!(Value::Object(data), json!({"slots": {}}));
}

#[tokio::test]
async fn server_hangup_is_empty() {
    let (target, _requests) = tcp_server(vec!["<close>"]).await;
    let mut client = MonitorClient::new(target);

    assert!(client.poll(&["jobs".to_string()]).await.is_empty());
    assert!(!client.is_connected());
}

#[tokio::test]
async fn silent_server_times_out() {
    let (target, _requests) = tcp_server(vec!["<silent>"]).await;
    let mut client = MonitorClient::new(target).with_timeout(Duration::from_millis(100));

    assert!(client.poll(&["jobs".to_string()]).await.is_empty());
    assert!(!client.is_connected());
}

#[tokio::test]
async fn refused_connection_is_empty() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    let mut client = MonitorClient::new(Target::Tcp { host: "127.0.0.1".into(), port });

    assert!(client.poll(&["jobs".to_string()]).await.is_empty());
}

#[tokio::test]
async fn update_polls_subscribed_items() {
    let (target, mut requests) = tcp_server(vec![r#"{"jobs":{},"slots":{}}"#, r#"{"jobs":{}}"#]).await;
    let mut client = MonitorClient::new(target);
    assert!(client.add_item("jobs"));
    assert!(client.add_item("slots"));
    assert!(!client.add_item("jobs"));

    assert_eq!(client.update().await.len(), 2);
    assert_eq!(requests.recv().await.unwrap(), "[\"jobs\",\"slots\"]\r\n");

    assert!(client.remove_item("slots"));
    assert_eq!(client.items().collect::<Vec<_>>(), vec!["jobs"]);
    client.update().await;
    assert_eq!(requests.recv().await.unwrap(), "[\"jobs\"]\r\n");
    assert_eq!(Value::Object(client.data().clone()), json!({"jobs": {}}));
}

#[tokio::test]
async fn get_one_item_over_unix_socket() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("stats.sock");
    let listener = UnixListener::bind(&path).unwrap();
    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let (read, mut write) = stream.into_split();
        let mut request = String::new();
        BufReader::new(read).read_line(&mut request).await.unwrap();
        assert_eq!(request, "[\"jobcount\"]\r\n");
        write.write_all(b"{\"jobcount\":3}\r\n").await.unwrap();
    });

    let mut client = MonitorClient::new(Target::Unix(path));
    assert_eq!(client.get_one_item("jobcount").await, Some(json!(3)));
}
