// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Token envelope and framing for inter-place communication.
//!
//! Wire format: 4-byte length prefix (big-endian) + JSON payload

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod envelope;
mod frame;

pub use envelope::{Envelope, Header, JoinAttribute, MonitorData, ServiceSection};
pub use frame::{decode, encode, read_envelope, write_envelope, ProtocolError, MAX_FRAME_LEN};

#[cfg(test)]
mod property_tests;
