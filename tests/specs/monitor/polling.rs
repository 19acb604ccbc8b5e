// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Monitor client specs
//!
//! `ctldash`'s client polling a live daemon, and what happens when the daemon
//! goes away.

use ctl_core::FakeClock;
use ctl_dash::{DashError, DashOptions, Dashboard, MonitorClient, Rates, Target};

use crate::prelude::*;

#[tokio::test]
async fn polls_over_tcp_and_unix() {
    let daemon = TestDaemon::start().await;
    let mut control = daemon.control().await;
    job_command(&mut control, &[("command", "enqueued"), ("work_type", "email")]).await;

    let tcp = Target::parse(&daemon.tcp.to_string()).unwrap();
    let unix = Target::Unix(daemon.stats_socket());
    for target in [tcp, unix] {
        let mut client = MonitorClient::new(target.clone());
        let data = client.poll(&["jobcount".to_string(), "jobcount".to_string()]).await;
        assert_eq!(Value::Object(data), json!({"jobcount": 1}), "via {target}");
        assert_eq!(client.get_one_item("unknown_item").await, Some(json!("")), "via {target}");
    }

    daemon.stop().await;
}

#[tokio::test]
async fn dashboard_rates_follow_the_queue() {
    let daemon = TestDaemon::start().await;
    let mut control = daemon.control().await;
    for _ in 0..4 {
        job_command(&mut control, &[("command", "enqueued"), ("work_type", "email")]).await;
    }

    let clock = FakeClock::new();
    let mut client = MonitorClient::new(Target::Unix(daemon.stats_socket()));
    client.add_item("jobs");
    client.add_item("job_assignments");
    let mut dash = Dashboard::new(client, clock.clone(), DashOptions::default());

    let first = dash.tick().await.unwrap();
    assert_eq!(first.rates, Rates::default());
    assert_eq!(first.counters.queued, 4);

    for _ in 0..2 {
        job_command(&mut control, &[("command", "assigned"), ("work_type", "email")]).await;
        job_command(&mut control, &[("command", "completed"), ("work_type", "email"), ("seconds", "0.1")])
            .await;
    }
    clock.advance(Duration::from_secs(2));

    let second = dash.tick().await.unwrap();
    assert_eq!(second.counters.queued, 2);
    assert_eq!(second.counters.completed, 2);
    assert_eq!(second.rates, Rates { queued: 1.0, completed: 1.0 });

    daemon.stop().await;
}

#[tokio::test]
async fn daemon_gone_means_no_valid_data() {
    let daemon = TestDaemon::start().await;
    let target = Target::Unix(daemon.stats_socket());
    let mut client = MonitorClient::new(target).with_timeout(Duration::from_secs(1));
    client.add_item("jobcount");
    let mut dash = Dashboard::new(client, FakeClock::new(), DashOptions::default());
    assert!(dash.tick().await.is_ok());

    daemon.stop().await;

    assert!(matches!(dash.tick().await, Err(DashError::NoValidData)));
}

#[tokio::test]
async fn allow_empty_keeps_polling_after_daemon_exit() {
    let daemon = TestDaemon::start().await;
    let target = Target::Unix(daemon.stats_socket());
    let mut client = MonitorClient::new(target).with_timeout(Duration::from_secs(1));
    client.add_item("jobcount");
    let options = DashOptions { allow_empty: true, ..DashOptions::default() };
    let mut dash = Dashboard::new(client, FakeClock::new(), options);

    daemon.stop().await;

    let snapshot = dash.tick().await.unwrap();
    assert!(snapshot.data.is_empty());
    assert!(!dash.client().is_connected());
}
