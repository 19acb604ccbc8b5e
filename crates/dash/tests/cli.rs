// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! ctldash command-line specs

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use std::io::{BufRead, BufReader, Write};
use std::os::unix::net::UnixListener;

use assert_cmd::Command;

fn ctldash() -> Command {
    let mut cmd = Command::cargo_bin("ctldash").unwrap();
    cmd.env("NO_COLOR", "1").env_remove("RUST_LOG");
    cmd
}

#[test]
fn help_shows_usage() {
    let out = ctldash().arg("--help").assert().success();
    let stdout = String::from_utf8(out.get_output().stdout.clone()).unwrap();
    assert!(stdout.contains("Usage:"));
    assert!(stdout.contains("--server"));
    assert!(stdout.contains("--allow-empty"));
}

#[test]
fn rejects_bad_interval() {
    ctldash().args(["--interval", "-1"]).assert().failure().code(2);
}

#[test]
fn rejects_bad_server() {
    ctldash().args(["--server", "host:notaport"]).assert().failure().code(2);
}

#[test]
fn unreachable_server_exits_with_no_valid_data() {
    let dir = tempfile::tempdir().unwrap();
    let server = format!("unix:{}", dir.path().join("missing.sock").display());

    let out = ctldash().args(["--server", &server, "--once"]).assert().failure().code(1);
    let stderr = String::from_utf8(out.get_output().stderr.clone()).unwrap();
    assert!(stderr.contains("no valid data"), "{stderr}");
}

#[test]
fn once_json_prints_one_line() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("stats.sock");
    let listener = UnixListener::bind(&path).unwrap();
    let server = std::thread::spawn(move || {
        let (stream, _) = listener.accept().unwrap();
        let mut request = String::new();
        BufReader::new(&stream).read_line(&mut request).unwrap();
        (&stream).write_all(b"{\"jobcount\":2}\r\n").unwrap();
        request
    });

    let out = ctldash()
        .args(["--server", &format!("unix:{}", path.display()), "--once", "--json", "jobcount"])
        .assert()
        .success();

    assert_eq!(server.join().unwrap(), "[\"jobcount\"]\r\n");
    let stdout = String::from_utf8(out.get_output().stdout.clone()).unwrap();
    let line: serde_json::Value = serde_json::from_str(stdout.trim()).unwrap();
    assert_eq!(line["data"], serde_json::json!({"jobcount": 2}));
    assert_eq!(line["rates"]["queued"], 0.0);
}
