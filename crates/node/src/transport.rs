// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Token transports: the in-process channel hub and the TCP listener.
//!
//! Both feed the same intakes; the hub resolves `channel:port` bindings
//! registered by local places, the listener decodes weft-wire frames
//! from remote peers.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tokio_util::sync::CancellationToken;
use weft_core::Token;
use weft_engine::{Destination, IntakeSender, TokenPublisher, TokenSource, TransportError};
use weft_wire::{read_envelope, Envelope, ProtocolError};

/// In-process routing table from `channel:port` to a place's intake.
///
/// Doubles as the publisher for every hosted place; a destination with
/// no local binding is a routing error surfaced per token.
#[derive(Default)]
pub struct ChannelHub {
    bindings: Mutex<HashMap<(String, u16), IntakeSender>>,
}

impl ChannelHub {
    pub fn new() -> ChannelHub {
        ChannelHub::default()
    }

    pub fn bind(&self, channel: &str, port: u16, intake: IntakeSender) {
        self.bindings.lock().insert((channel.to_string(), port), intake);
    }

    pub fn unbind(&self, channel: &str, port: u16) {
        self.bindings.lock().remove(&(channel.to_string(), port));
    }

    pub fn is_bound(&self, channel: &str, port: u16) -> bool {
        self.bindings.lock().contains_key(&(channel.to_string(), port))
    }

    fn sender_for(&self, dest: &Destination) -> Option<IntakeSender> {
        self.bindings.lock().get(&(dest.channel.to_string(), dest.port)).cloned()
    }
}

#[async_trait]
impl TokenPublisher for ChannelHub {
    async fn publish(&self, dest: &Destination, token: Token) -> Result<(), TransportError> {
        let sender = self.sender_for(dest).ok_or_else(|| TransportError::NoRoute {
            channel: dest.channel.to_string(),
            port: dest.port,
        })?;
        sender.send(token).await
    }
}

/// The inbound side of a hub binding: registers the place's intake under
/// its configured channel and port.
pub struct HubSource {
    hub: Arc<ChannelHub>,
    channel: String,
    port: u16,
}

impl HubSource {
    pub fn new(hub: Arc<ChannelHub>, channel: &str, port: u16) -> HubSource {
        HubSource { hub, channel: channel.to_string(), port }
    }
}

#[async_trait]
impl TokenSource for HubSource {
    async fn start(&mut self, intake: IntakeSender) -> Result<(), TransportError> {
        if self.hub.is_bound(&self.channel, self.port) {
            return Err(TransportError::Bind {
                channel: self.channel.clone(),
                port: self.port,
                reason: "already bound".to_string(),
            });
        }
        self.hub.bind(&self.channel, self.port, intake);
        Ok(())
    }
}

/// TCP ingress: accepts connections and forwards decoded envelopes into
/// the hub by the destination's own binding.
pub struct TcpTokenListener {
    hub: Arc<ChannelHub>,
    shutdown: CancellationToken,
}

impl TcpTokenListener {
    pub fn new(hub: Arc<ChannelHub>, shutdown: CancellationToken) -> TcpTokenListener {
        TcpTokenListener { hub, shutdown }
    }

    /// Bind and serve until shutdown. Each connection gets its own task;
    /// connection failures are logged and never take the listener down.
    pub async fn serve(&self, addr: &str) -> Result<(), TransportError> {
        let listener = TcpListener::bind(addr).await.map_err(|e| TransportError::Bind {
            channel: addr.to_string(),
            port: 0,
            reason: e.to_string(),
        })?;
        tracing::info!(addr, "token listener up");
        loop {
            tokio::select! {
                _ = self.shutdown.cancelled() => return Ok(()),
                accepted = listener.accept() => {
                    match accepted {
                        Ok((stream, peer)) => {
                            let hub = self.hub.clone();
                            let shutdown = self.shutdown.clone();
                            tokio::spawn(async move {
                                if let Err(e) = serve_connection(hub, stream, shutdown).await {
                                    tracing::warn!(error = %e, %peer, "connection closed with error");
                                }
                            });
                        }
                        Err(e) => tracing::warn!(error = %e, "accept failed"),
                    }
                }
            }
        }
    }
}

async fn serve_connection(
    hub: Arc<ChannelHub>,
    mut stream: TcpStream,
    shutdown: CancellationToken,
) -> Result<(), ProtocolError> {
    loop {
        let envelope: Envelope = tokio::select! {
            _ = shutdown.cancelled() => return Ok(()),
            read = read_envelope(&mut stream) => match read {
                Ok(envelope) => envelope,
                Err(ProtocolError::Closed) => return Ok(()),
                Err(e) => return Err(e),
            }
        };
        // Arrival stamp for analytics; the transport is the first to see
        // the token on this host.
        let mut token = envelope.into_token();
        if token.event_arrival_ms == 0 {
            token.event_arrival_ms = now_ms();
        }
        // Deliver to whichever local place serves the token's service;
        // an unbound destination is the sender's misconfiguration.
        let delivered = deliver_local(&hub, token).await;
        if let Err(e) = delivered {
            tracing::warn!(error = %e, "inbound token not deliverable");
        }
    }
}

/// Route an inbound token to the locally bound intakes.
///
/// Remote senders address services, not channels. Every place filters by
/// address on dequeue, so the token fans to all intakes and the filters
/// drop the copies that are not theirs.
async fn deliver_local(hub: &ChannelHub, token: Token) -> Result<(), TransportError> {
    let senders: Vec<IntakeSender> = hub.bindings.lock().values().cloned().collect();
    for sender in &senders {
        sender.send(token.clone()).await?;
    }
    Ok(())
}

fn now_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

#[cfg(test)]
#[path = "transport_tests.rs"]
mod tests;
