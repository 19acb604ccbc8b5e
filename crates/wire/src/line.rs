// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Line protocol of the introspection service.
//!
//! A request is one line holding a JSON array of query names, or a
//! termination token. A response is one line holding a JSON object keyed by
//! query name, the bad-command sentinel, or the exit acknowledgement.

use indexmap::IndexSet;
use serde_json::{Map, Value};
use thiserror::Error;

/// Reply sent before the service closes the connection on `exit`/`quit`.
pub const EXIT_ACK: &str = "Done";

/// Reply to a request that is not a JSON array of query names.
pub const BAD_COMMAND: &str = "\"BAD\"";

const TERMINATORS: [&str; 2] = ["exit", "quit"];

/// A parsed request line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Acknowledge and close the connection.
    Exit,
    /// Resolve these distinct query names, in order of first appearance.
    Query(Vec<String>),
}

/// Reasons a request line is answered with [`BAD_COMMAND`].
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("request is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("request must be a JSON array of query names")]
    NotAnArray,

    #[error("query names must be strings")]
    NonStringQuery,

    #[error("too many queries in one request: {count} (max {max})")]
    TooManyQueries { count: usize, max: usize },
}

/// Parse one request line (without its terminator).
pub fn parse_command(line: &str, max_queries: usize) -> Result<Command, CommandError> {
    let line = line.trim();
    if is_terminator(line) {
        return Ok(Command::Exit);
    }

    let items = match serde_json::from_str::<Value>(line)? {
        Value::Array(items) => items,
        Value::String(s) if is_terminator(&s) => return Ok(Command::Exit),
        _ => return Err(CommandError::NotAnArray),
    };

    let mut names = IndexSet::with_capacity(items.len());
    for item in items {
        match item {
            Value::String(name) => {
                names.insert(name);
            }
            _ => return Err(CommandError::NonStringQuery),
        }
    }

    if names.len() == 1 && names.iter().any(|n| is_terminator(n)) {
        return Ok(Command::Exit);
    }
    if names.len() > max_queries {
        return Err(CommandError::TooManyQueries { count: names.len(), max: max_queries });
    }
    Ok(Command::Query(names.into_iter().collect()))
}

fn is_terminator(s: &str) -> bool {
    TERMINATORS.contains(&s)
}

/// Encode a request for `names`, without the line terminator.
pub fn encode_request(names: &[String]) -> String {
    Value::Array(names.iter().cloned().map(Value::String).collect()).to_string()
}

/// Encode a response object, without the line terminator.
pub fn encode_reply(results: &Map<String, Value>) -> String {
    Value::Object(results.clone()).to_string()
}

/// Decode a response line. Anything other than a JSON object is `None`.
pub fn decode_reply(line: &str) -> Option<Map<String, Value>> {
    match serde_json::from_str::<Value>(line.trim()) {
        Ok(Value::Object(map)) => Some(map),
        _ => None,
    }
}

#[cfg(test)]
#[path = "line_tests.rs"]
mod tests;
