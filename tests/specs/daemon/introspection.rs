// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Introspection service specs
//!
//! Line-oriented JSON queries against a running daemon, over both its Unix
//! socket and its TCP port.

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;

use crate::prelude::*;

#[tokio::test]
async fn jobcount_counts_work_types() {
    let daemon = TestDaemon::start().await;
    let mut control = daemon.control().await;
    for work_type in ["a", "b", "c", "d", "e", "f", "g"] {
        job_command(&mut control, &[("command", "enqueued"), ("work_type", work_type)]).await;
    }

    let mut stats = daemon.introspect().await;
    assert_eq!(stats.request(r#"["jobcount"]"#).await, r#"{"jobcount":7}"#);

    daemon.stop().await;
}

#[tokio::test]
async fn unknown_query_answers_empty_string() {
    let daemon = TestDaemon::start().await;
    let mut stats = daemon.introspect().await;

    assert_eq!(stats.request(r#"["unknown_query_xyz"]"#).await, r#"{"unknown_query_xyz":""}"#);

    daemon.stop().await;
}

#[tokio::test]
async fn bad_command_keeps_connection_open() {
    let daemon = TestDaemon::start().await;
    let mut stats = daemon.introspect().await;

    assert_eq!(stats.request("{not valid json").await, "\"BAD\"");
    assert_eq!(stats.request(r#"{"jobcount": 1}"#).await, "\"BAD\"");
    assert_eq!(stats.request(r#"["jobcount"]"#).await, r#"{"jobcount":0}"#);

    daemon.stop().await;
}

#[tokio::test]
async fn exit_acknowledges_then_closes() {
    let daemon = TestDaemon::start().await;
    for exit in [r#"["exit"]"#, "quit", r#""exit""#] {
        let mut stats = daemon.introspect().await;
        assert_eq!(stats.request(exit).await, "Done", "for {exit}");
        assert_eq!(stats.recv().await, None, "for {exit}");
    }
    daemon.stop().await;
}

#[tokio::test]
async fn replies_keep_request_order_and_degrade_missing_collaborators() {
    let daemon = TestDaemon::start().await;
    let mut stats = daemon.introspect().await;

    let line = stats.request(r#"["slots", "jobcount", "directory", "jobs"]"#).await;
    let reply: Value = serde_json::from_str(&line).unwrap();
    let keys: Vec<&str> = reply.as_object().unwrap().keys().map(String::as_str).collect();
    assert_eq!(keys, ["slots", "jobcount", "directory", "jobs"]);
    // The daemon runs without a load limiter or directory service.
    assert_eq!(reply["slots"], json!({"slots": [], "overloaded": false}));
    assert_eq!(reply["directory"], json!({}));
    assert_eq!(reply["jobs"], json!({}));

    daemon.stop().await;
}

#[tokio::test]
async fn serves_over_tcp() {
    let daemon = TestDaemon::start().await;
    let stream = TcpStream::connect(daemon.tcp).await.unwrap();
    let (read, mut write) = stream.into_split();
    let mut lines = BufReader::new(read).lines();

    write.write_all(b"[\"jobcount\", \"jobcount\"]\r\n").await.unwrap();
    let line = tokio::time::timeout(SPEC_WAIT_MAX, lines.next_line()).await.unwrap().unwrap();
    assert_eq!(line.as_deref(), Some(r#"{"jobcount":0}"#));

    write.write_all(b"[\"quit\"]\r\n").await.unwrap();
    let line = tokio::time::timeout(SPEC_WAIT_MAX, lines.next_line()).await.unwrap().unwrap();
    assert_eq!(line.as_deref(), Some("Done"));

    daemon.stop().await;
}
