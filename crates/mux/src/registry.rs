// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Route registration.
//!
//! Routes are registered on a [`RouteRegistryBuilder`] during configuration;
//! `build` consumes it into a read-only [`RouteRegistry`], so nothing can be
//! registered once a multiplexer is running.

use std::sync::Arc;

use ctl_core::RouteKey;
use indexmap::IndexMap;

use crate::{MuxError, SessionFactory};

type Routes = IndexMap<RouteKey, Arc<dyn SessionFactory>>;

#[derive(Default)]
pub struct RouteRegistryBuilder {
    routes: Routes,
}

impl RouteRegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `factory` under `key`. Registration order is the order in
    /// which sessions are started and stopped.
    pub fn register(
        &mut self,
        key: impl Into<RouteKey>,
        factory: impl SessionFactory,
    ) -> Result<&mut Self, MuxError> {
        let key = key.into();
        if key.is_empty() {
            return Err(MuxError::EmptyRouteKey);
        }
        if self.routes.contains_key(&key) {
            return Err(MuxError::DuplicateRoute(key));
        }
        self.routes.insert(key, Arc::new(factory));
        Ok(self)
    }

    pub fn build(self) -> Result<RouteRegistry, MuxError> {
        if self.routes.is_empty() {
            return Err(MuxError::NoRoutes);
        }
        Ok(RouteRegistry { routes: Arc::new(self.routes) })
    }
}

/// Immutable route table shared by every connection of a multiplexer.
#[derive(Clone)]
pub struct RouteRegistry {
    routes: Arc<Routes>,
}

impl RouteRegistry {
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Always false for a built registry; present for symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.routes.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &RouteKey> {
        self.routes.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&RouteKey, &Arc<dyn SessionFactory>)> {
        self.routes.iter()
    }
}

impl std::fmt::Debug for RouteRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.routes.keys()).finish()
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
