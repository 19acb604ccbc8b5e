// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Query dispatch table of the introspection service.

use std::collections::HashMap;

use futures_util::future::{join, join_all, BoxFuture};
use indexmap::IndexSet;
use serde_json::{Map, Value};
use tracing::debug;

use super::handlers;
use crate::adapters::Collaborators;

/// Produces the value of one query from the collaborators.
pub type Handler = for<'a> fn(&'a Collaborators) -> BoxFuture<'a, Value>;

/// Picks a sub-key out of an aggregate handler's value.
pub type Extract = fn(&Value, &str) -> Value;

/// How a registered name is answered.
#[derive(Clone, Copy)]
pub enum QueryHandler {
    /// The name itself is the query.
    Exact(Handler),
    /// The name is a prefix; `<prefix><key>` answers `extract(aggregate, key)`.
    /// The aggregate runs at most once per request.
    Prefixed { aggregate: Handler, extract: Extract },
}

enum Lookup<'a> {
    Exact(Handler),
    Projected { prefix: &'a str, aggregate: Handler, extract: Extract, key: &'a str },
    Unknown,
}

/// Query names and prefixes, bound to the collaborators they read from.
pub struct QueryTable {
    handlers: HashMap<String, QueryHandler>,
    /// Registered prefixes, longest first
    prefixes: Vec<String>,
    collaborators: Collaborators,
}

impl QueryTable {
    /// An empty table; every name resolves to the empty string.
    pub fn new(collaborators: Collaborators) -> Self {
        Self { handlers: HashMap::new(), prefixes: Vec::new(), collaborators }
    }

    /// The built-in queries: `stats` (and `stats_<key>`), `slots`, `jobcount`,
    /// `jobs`, `job_assignments` and `directory`.
    pub fn builtin(collaborators: Collaborators) -> Self {
        let mut table = Self::new(collaborators);
        table.insert("stats", QueryHandler::Exact(handlers::stats));
        table.insert(
            "stats_",
            QueryHandler::Prefixed { aggregate: handlers::stats, extract: handlers::project },
        );
        table.insert("slots", QueryHandler::Exact(handlers::slots));
        table.insert("jobcount", QueryHandler::Exact(handlers::jobcount));
        table.insert("jobs", QueryHandler::Exact(handlers::jobs));
        table.insert("job_assignments", QueryHandler::Exact(handlers::job_assignments));
        table.insert("directory", QueryHandler::Exact(handlers::directory));
        table
    }

    /// Register `name`, replacing any previous handler for it.
    pub fn insert(&mut self, name: impl Into<String>, handler: QueryHandler) {
        let name = name.into();
        if let QueryHandler::Prefixed { .. } = handler {
            if !self.prefixes.contains(&name) {
                self.prefixes.push(name.clone());
                self.prefixes.sort_by_key(|p| std::cmp::Reverse(p.len()));
            }
        } else {
            self.prefixes.retain(|p| p != &name);
        }
        self.handlers.insert(name, handler);
    }

    fn lookup<'a>(&'a self, name: &'a str) -> Lookup<'a> {
        if let Some(QueryHandler::Exact(handler)) = self.handlers.get(name) {
            return Lookup::Exact(*handler);
        }
        for prefix in &self.prefixes {
            let Some(key) = name.strip_prefix(prefix.as_str()).filter(|k| !k.is_empty()) else {
                continue;
            };
            if let Some(QueryHandler::Prefixed { aggregate, extract }) = self.handlers.get(prefix) {
                return Lookup::Projected { prefix, aggregate: *aggregate, extract: *extract, key };
            }
        }
        Lookup::Unknown
    }

    /// Resolve every name concurrently and collect the answers, keyed by
    /// name. Unknown names answer the empty string.
    pub async fn resolve(&self, names: &[String]) -> Map<String, Value> {
        let lookups: Vec<Lookup<'_>> = names.iter().map(|n| self.lookup(n)).collect();

        let exact = join_all(lookups.iter().enumerate().filter_map(|(i, lookup)| match lookup {
            Lookup::Exact(handler) => {
                let handler = *handler;
                Some(async move { (i, handler(&self.collaborators).await) })
            }
            _ => None,
        }));

        let mut aggregates_needed: IndexSet<&str> = IndexSet::new();
        let mut aggregate_handlers = Vec::new();
        for lookup in &lookups {
            if let Lookup::Projected { prefix, aggregate, .. } = lookup {
                if aggregates_needed.insert(*prefix) {
                    aggregate_handlers.push((*prefix, *aggregate));
                }
            }
        }
        let aggregates = join_all(aggregate_handlers.into_iter().map(|(prefix, aggregate)| async move {
            (prefix, aggregate(&self.collaborators).await)
        }));

        let (exact, aggregates) = join(exact, aggregates).await;
        let mut exact: HashMap<usize, Value> = exact.into_iter().collect();
        let aggregates: HashMap<&str, Value> = aggregates.into_iter().collect();

        let mut results = Map::new();
        for (i, (name, lookup)) in names.iter().zip(&lookups).enumerate() {
            let value = match lookup {
                Lookup::Exact(_) => exact.remove(&i).unwrap_or_else(handlers::empty),
                Lookup::Projected { prefix, extract, key, .. } => match aggregates.get(prefix) {
                    Some(aggregate) => extract(aggregate, *key),
                    None => handlers::empty(),
                },
                Lookup::Unknown => {
                    debug!(query = %name, "unknown query");
                    handlers::empty()
                }
            };
            results.insert(name.clone(), value);
        }
        results
    }
}

#[cfg(test)]
#[path = "query_tests.rs"]
mod tests;
