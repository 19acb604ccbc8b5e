// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session factories for tests: one that records everything it sees and one
//! that echoes boxes back to the peer.

use std::sync::Arc;

use async_trait::async_trait;
use ctl_core::RouteKey;
use ctl_wire::FieldBox;
use parking_lot::Mutex;

use crate::{ConnectionInfo, Disconnect, DispatchingSender, Session, SessionFactory};

/// Something a recording session or factory observed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recorded {
    FactoryStarted(String),
    FactoryStopped(String),
    Started { label: String, conn: u64, route: RouteKey },
    Received { label: String, conn: u64, b: FieldBox },
    Stopped { label: String, conn: u64, reason: Disconnect },
}

/// Log shared by any number of recording factories, so ordering across
/// routes can be asserted.
#[derive(Debug, Clone, Default)]
pub struct RecordLog {
    inner: Arc<Mutex<Vec<Recorded>>>,
}

impl RecordLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, event: Recorded) {
        self.inner.lock().push(event);
    }

    pub fn events(&self) -> Vec<Recorded> {
        self.inner.lock().clone()
    }

    /// Boxes received by sessions labelled `label`, in delivery order.
    pub fn received(&self, label: &str) -> Vec<FieldBox> {
        self.inner
            .lock()
            .iter()
            .filter_map(|e| match e {
                Recorded::Received { label: l, b, .. } if l == label => Some(b.clone()),
                _ => None,
            })
            .collect()
    }

    /// Disconnect reasons seen by sessions labelled `label`.
    pub fn stopped(&self, label: &str) -> Vec<Disconnect> {
        self.inner
            .lock()
            .iter()
            .filter_map(|e| match e {
                Recorded::Stopped { label: l, reason, .. } if l == label => Some(reason.clone()),
                _ => None,
            })
            .collect()
    }
}

/// Builds sessions that record their lifecycle and every box into a
/// [`RecordLog`]. Senders handed to started sessions are kept so tests can
/// send on a route's behalf.
#[derive(Clone)]
pub struct RecordingFactory {
    label: String,
    log: RecordLog,
    senders: Arc<Mutex<Vec<DispatchingSender>>>,
}

impl RecordingFactory {
    pub fn new(label: impl Into<String>, log: RecordLog) -> Self {
        Self { label: label.into(), log, senders: Arc::default() }
    }

    /// Senders of every session started so far, in start order.
    pub fn senders(&self) -> Vec<DispatchingSender> {
        self.senders.lock().clone()
    }
}

#[async_trait]
impl SessionFactory for RecordingFactory {
    fn build(&self, conn: &ConnectionInfo) -> Box<dyn Session> {
        Box::new(RecordingSession { factory: self.clone(), conn: conn.id })
    }

    async fn start(&self) {
        self.log.push(Recorded::FactoryStarted(self.label.clone()));
    }

    async fn stop(&self) {
        self.log.push(Recorded::FactoryStopped(self.label.clone()));
    }
}

struct RecordingSession {
    factory: RecordingFactory,
    conn: u64,
}

#[async_trait]
impl Session for RecordingSession {
    async fn started(&mut self, sender: DispatchingSender) {
        self.factory.log.push(Recorded::Started {
            label: self.factory.label.clone(),
            conn: self.conn,
            route: sender.route().clone(),
        });
        self.factory.senders.lock().push(sender);
    }

    async fn box_received(&mut self, b: FieldBox) {
        self.factory.log.push(Recorded::Received {
            label: self.factory.label.clone(),
            conn: self.conn,
            b,
        });
    }

    async fn stopped(&mut self, reason: &Disconnect) {
        self.factory.log.push(Recorded::Stopped {
            label: self.factory.label.clone(),
            conn: self.conn,
            reason: reason.clone(),
        });
    }
}

/// Builds sessions that send every received box straight back on their own
/// route.
#[derive(Debug, Clone, Copy, Default)]
pub struct EchoFactory;

#[async_trait]
impl SessionFactory for EchoFactory {
    fn build(&self, _conn: &ConnectionInfo) -> Box<dyn Session> {
        Box::new(EchoSession { sender: None })
    }
}

struct EchoSession {
    sender: Option<DispatchingSender>,
}

#[async_trait]
impl Session for EchoSession {
    async fn started(&mut self, sender: DispatchingSender) {
        self.sender = Some(sender);
    }

    async fn box_received(&mut self, b: FieldBox) {
        if let Some(sender) = &self.sender {
            if let Err(e) = sender.send(&b) {
                sender.report_error(e.to_string());
            }
        }
    }

    async fn stopped(&mut self, _reason: &Disconnect) {
        self.sender = None;
    }
}
