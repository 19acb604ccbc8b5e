// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Proptest strategies shared by the wire and mux crates' tests.

use proptest::prelude::*;

use crate::RouteKey;

/// Route keys as a registry would accept them: short, non-empty, printable.
pub fn arb_route_key() -> impl Strategy<Value = RouteKey> {
    "[a-z][a-z0-9_.-]{0,15}".prop_map(RouteKey::from)
}

/// Application field names that never collide with the multiplexer's
/// reserved fields (which all start with an underscore).
pub fn arb_field_name() -> impl Strategy<Value = String> {
    "[a-zA-Z][a-zA-Z0-9_-]{0,31}"
}

/// Arbitrary binary field values, including empty ones.
pub fn arb_field_value() -> impl Strategy<Value = Vec<u8>> {
    proptest::collection::vec(any::<u8>(), 0..64)
}
