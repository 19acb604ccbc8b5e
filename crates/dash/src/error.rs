// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use thiserror::Error;

/// Dashboard errors
#[derive(Debug, Error)]
pub enum DashError {
    #[error("invalid server address {0:?}: expected host[:port] or unix:<path>")]
    InvalidTarget(String),

    #[error("invalid interval {0:?}: expected a positive number of seconds")]
    InvalidInterval(String),

    /// A poll with subscribed items came back empty.
    #[error("no valid data")]
    NoValidData,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
