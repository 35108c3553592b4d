// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Transport seams: how tokens reach and leave a place.
//!
//! The engine never opens sockets itself; hosts implement these traits
//! (channel hub, TCP listener, test doubles) and hand them in.

use crate::intake::IntakeSender;
use async_trait::async_trait;
use smol_str::SmolStr;
use thiserror::Error;
use weft_core::Token;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("failed to bind {channel}:{port}: {reason}")]
    Bind { channel: String, port: u16, reason: String },

    #[error("no route to {channel}:{port}")]
    NoRoute { channel: String, port: u16 },

    #[error("intake full")]
    IntakeFull,

    #[error("intake closed")]
    IntakeClosed,

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Resolved delivery target for one outgoing token.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Destination {
    pub channel: SmolStr,
    pub port: u16,
}

impl Destination {
    pub fn new(channel: impl Into<SmolStr>, port: u16) -> Destination {
        Destination { channel: channel.into(), port }
    }
}

impl std::fmt::Display for Destination {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.channel, self.port)
    }
}

/// Inbound transport: binds its endpoint and feeds tokens into the
/// intake for the orchestrator to dequeue.
#[async_trait]
pub trait TokenSource: Send {
    async fn start(&mut self, intake: IntakeSender) -> Result<(), TransportError>;
}

/// Outbound transport: delivers a token to a resolved destination.
#[async_trait]
pub trait TokenPublisher: Send + Sync {
    async fn publish(&self, dest: &Destination, token: Token) -> Result<(), TransportError>;
}
