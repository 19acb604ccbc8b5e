// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Control multiplexer specs
//!
//! A master and a child multiplexer, each with the same routes, share one
//! TCP connection; every route behaves as if it had a private one.

use ctl_mux::test_support::{RecordLog, RecordingFactory};
use ctl_mux::{ControlMultiplexer, Disconnect, RouteRegistryBuilder};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use crate::prelude::*;

const ROUTES: [&str; 3] = ["jobs", "logging", "directory"];

fn multiplexer(side: &str, log: &RecordLog) -> (ControlMultiplexer, Vec<RecordingFactory>) {
    let mut builder = RouteRegistryBuilder::new();
    let mut factories = Vec::new();
    for route in ROUTES {
        let factory = RecordingFactory::new(format!("{side}/{route}"), log.clone());
        builder.register(route, factory.clone()).unwrap();
        factories.push(factory);
    }
    (ControlMultiplexer::new(builder.build().unwrap()), factories)
}

fn numbered(i: usize) -> FieldBox {
    FieldBox::new().with("seq", i.to_string())
}

#[tokio::test]
async fn routes_share_one_connection_in_both_directions() {
    let log = RecordLog::new();
    let (master, master_routes) = multiplexer("master", &log);
    let (child, child_routes) = multiplexer("child", &log);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let cancel = CancellationToken::new();
    let serve = tokio::spawn({
        let master = master.clone();
        let cancel = cancel.clone();
        async move { master.serve_tcp(listener, cancel).await }
    });
    let handle = child.connect_tcp(addr).await.unwrap();

    // Child to master: interleave ten boxes across the three routes.
    assert!(wait_for(SPEC_WAIT_MAX, || child_routes.iter().all(|f| f.senders().len() == 1)).await);
    for i in 0..10 {
        let sender = &child_routes[i % ROUTES.len()].senders()[0];
        sender.send(&numbered(i)).unwrap();
    }
    assert!(
        wait_for(SPEC_WAIT_MAX, || {
            ROUTES.iter().map(|r| log.received(&format!("master/{r}")).len()).sum::<usize>() == 10
        })
        .await
    );
    for (n, route) in ROUTES.iter().enumerate() {
        let seqs: Vec<String> = log
            .received(&format!("master/{route}"))
            .iter()
            .map(|b| b.get_str("seq").unwrap().to_string())
            .collect();
        let expected: Vec<String> = (0..10).filter(|i| i % ROUTES.len() == n).map(|i| i.to_string()).collect();
        assert_eq!(seqs, expected, "route {route}");
    }

    // Master to child: the reply reaches only the matching route, untagged.
    assert!(wait_for(SPEC_WAIT_MAX, || master_routes[1].senders().len() == 1).await);
    master_routes[1].senders()[0].send(&FieldBox::new().with("level", "debug")).unwrap();
    assert!(wait_for(SPEC_WAIT_MAX, || log.received("child/logging").len() == 1).await);
    assert_eq!(log.received("child/logging"), vec![FieldBox::new().with("level", "debug")]);
    assert!(log.received("child/jobs").is_empty());

    assert_eq!(handle.close().await, Disconnect::Shutdown);
    assert!(
        wait_for(SPEC_WAIT_MAX, || ROUTES.iter().all(|r| log.stopped(&format!("master/{r}")).len() == 1))
            .await
    );
    cancel.cancel();
    serve.await.unwrap();
}

#[tokio::test]
async fn each_connection_gets_fresh_sessions() {
    let log = RecordLog::new();
    let (master, master_routes) = multiplexer("master", &log);
    let (child, _) = multiplexer("child", &log);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let cancel = CancellationToken::new();
    let serve = tokio::spawn({
        let master = master.clone();
        let cancel = cancel.clone();
        async move { master.serve_tcp(listener, cancel).await }
    });

    let first = child.connect_tcp(addr).await.unwrap();
    let second = child.connect_tcp(addr).await.unwrap();
    assert!(wait_for(SPEC_WAIT_MAX, || master_routes.iter().all(|f| f.senders().len() == 2)).await);

    first.close().await;
    second.close().await;
    cancel.cancel();
    serve.await.unwrap();
}
