// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Control route specs
//!
//! Children report job and request activity over the multiplexed control
//! socket; the introspection service reflects it.

use crate::prelude::*;

#[tokio::test]
async fn job_reports_show_up_in_histogram_and_assignments() {
    let daemon = TestDaemon::start().await;
    let mut control = daemon.control().await;

    for _ in 0..3 {
        let ack = job_command(&mut control, &[("command", "enqueued"), ("work_type", "email")]).await;
        assert_eq!(ack.get_str("ok"), Some("1"));
        assert_eq!(ack.get_str("_route"), Some("jobs"));
    }
    job_command(&mut control, &[("command", "assigned"), ("work_type", "email"), ("weight", "2")]).await;

    let mut stats = daemon.introspect().await;
    let reply = stats.query(r#"["jobs", "job_assignments", "jobcount"]"#).await;
    assert_eq!(reply["jobcount"], 1);
    assert_eq!(reply["jobs"]["email"]["queued"], 2);
    assert_eq!(reply["jobs"]["email"]["assigned"], 1);
    assert_eq!(reply["job_assignments"], json!({"workers": [[1, 2, 0]], "level": 40}));

    job_command(
        &mut control,
        &[("command", "completed"), ("work_type", "email"), ("weight", "2"), ("seconds", "0.5")],
    )
    .await;
    let reply = stats.query(r#"["jobs", "job_assignments"]"#).await;
    assert_eq!(reply["jobs"]["email"]["completed"], 1);
    assert_eq!(reply["jobs"]["email"]["time"], 0.5);
    assert_eq!(reply["job_assignments"], json!({"workers": [[0, 0, 1]], "level": 0}));

    daemon.stop().await;
}

#[tokio::test]
async fn malformed_job_command_is_answered_and_connection_survives() {
    let daemon = TestDaemon::start().await;
    let mut control = daemon.control().await;

    let ack = job_command(&mut control, &[("command", "teleported"), ("work_type", "email")]).await;
    assert!(ack.get_str("error").is_some_and(|e| e.contains("teleported")), "{ack:?}");

    let ack = job_command(&mut control, &[("command", "enqueued"), ("work_type", "email")]).await;
    assert_eq!(ack.get_str("ok"), Some("1"));

    daemon.stop().await;
}

#[tokio::test]
async fn lost_worker_returns_items_to_queue() {
    let daemon = TestDaemon::start().await;
    let mut control = daemon.control().await;
    job_command(&mut control, &[("command", "enqueued"), ("work_type", "push")]).await;
    job_command(&mut control, &[("command", "assigned"), ("work_type", "push")]).await;
    assert_eq!(daemon.jobs.histogram_snapshot()["push"].assigned, 1);

    drop(control);

    let jobs = daemon.jobs.clone();
    assert!(
        wait_for(SPEC_WAIT_MAX, || {
            let push = jobs.histogram_snapshot()["push"].clone();
            push.assigned == 0 && push.queued == 1 && jobs.worker_loads().is_empty()
        })
        .await
    );

    daemon.stop().await;
}

#[tokio::test]
async fn unknown_route_closes_only_that_connection() {
    let daemon = TestDaemon::start().await;
    let mut healthy = daemon.control().await;
    let mut rogue = daemon.control().await;

    let b = FieldBox::new().with("_route", "billing").with("command", "charge");
    ctl_wire::write_box(&mut rogue, &b).await.unwrap();
    let closed = ctl_wire::read_box_timeout(&mut rogue, SPEC_WAIT_MAX).await;
    assert!(matches!(closed, Err(ctl_wire::ProtocolError::ConnectionClosed)), "{closed:?}");

    let ack = job_command(&mut healthy, &[("command", "enqueued"), ("work_type", "email")]).await;
    assert_eq!(ack.get_str("ok"), Some("1"));

    daemon.stop().await;
}

#[tokio::test]
async fn request_logs_feed_stats() {
    let daemon = TestDaemon::start().await;
    let mut control = daemon.control().await;

    for (method, status) in [("GET", "200"), ("GET", "500"), ("PUT", "401")] {
        let b = FieldBox::new()
            .with("_route", "logging")
            .with("command", "request")
            .with("method", method)
            .with("status", status)
            .with("seconds", "0.02");
        ctl_wire::write_box(&mut control, &b).await.unwrap();
    }
    // Logging has no reply; a jobs round trip on the same connection orders
    // after the three boxes above.
    job_command(&mut control, &[("command", "late"), ("work_type", "email")]).await;

    let mut stats = daemon.introspect().await;
    let reply = stats.query(r#"["stats"]"#).await;
    // A minute boundary may fall between the reports and the query.
    let windows = [&reply["stats"]["current"], &reply["stats"]["1m"]];
    let sum = |f: &dyn Fn(&Value) -> u64| -> u64 { windows.iter().map(|w| f(w)).sum() };
    assert_eq!(sum(&|w| w["requests"].as_u64().unwrap_or(0)), 3);
    assert_eq!(sum(&|w| w["method"]["GET"].as_u64().unwrap_or(0)), 2);
    assert_eq!(sum(&|w| w["method"]["PUT"].as_u64().unwrap_or(0)), 1);
    assert_eq!(sum(&|w| w["500"].as_u64().unwrap_or(0)), 1);
    assert_eq!(sum(&|w| w["401"].as_u64().unwrap_or(0)), 1);
    assert!(reply["stats"]["system"]["start time"].as_f64().unwrap() > 0.0);

    daemon.stop().await;
}

#[tokio::test]
async fn shutdown_removes_runtime_files() {
    let daemon = TestDaemon::start().await;
    assert!(daemon.config.control_socket.exists());

    let config = daemon.stop().await;

    assert!(!config.control_socket.exists());
    assert!(!config.stats_socket.exists());
    assert!(!config.lock_path.exists());
}
