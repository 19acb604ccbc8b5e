// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Process-local collaborators fed by the control routes.
//!
//! These keep just enough state for the introspection service to have
//! something to report when the daemon runs on its own.

mod jobs;
mod requests;

pub use jobs::{JobEvent, JobLedger};
pub use requests::{RequestRecord, RequestStats};
