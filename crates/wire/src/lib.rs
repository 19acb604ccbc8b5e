// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Wire formats shared by the daemon, its children and the dashboard.
//!
//! - Control connections carry [`FieldBox`]es: each field is a 2-byte
//!   big-endian key length, the key, a 2-byte big-endian value length and the
//!   value; a zero key length terminates the box.
//! - The introspection service speaks newline-terminated JSON lines, see
//!   [`line`].

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod field_box;
mod frame;
pub mod line;

pub use field_box::FieldBox;
pub use frame::{
    decode_box, encode_box, read_box, read_box_timeout, write_box, ProtocolError, MAX_KEY_LEN, MAX_VALUE_LEN,
};
pub use line::{Command, CommandError};
