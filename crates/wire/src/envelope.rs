// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The four-section token document exchanged between places.
//!
//! Field names are the cross-implementation contract and serialize in
//! camelCase exactly as written here; the engine-side [`Token`] is the
//! flattened internal view.

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use weft_core::{Token, TokenId};

/// Routing and rule-base selection fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Header {
    pub sequence_id: i32,
    pub rule_base_version: SmolStr,
    pub monitor_incoming_events: bool,
}

/// Destination identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceSection {
    pub service_name: SmolStr,
    pub operation: SmolStr,
}

/// The input slot this token contributes, plus the join deadline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinAttribute {
    pub attribute_name: SmolStr,
    pub attribute_value: String,
    pub not_after: u64,
    pub status: SmolStr,
}

/// Provenance for analytics and animation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonitorData {
    pub process_start_time: u64,
    #[serde(default)]
    pub event_arrival_time: u64,
    #[serde(default)]
    pub event_generator_timestamp: u64,
    #[serde(default, skip_serializing_if = "SmolStr::is_empty")]
    pub source_event_generator: SmolStr,
}

/// One token on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    pub header: Header,
    pub service: ServiceSection,
    pub join_attribute: JoinAttribute,
    pub monitor_data: MonitorData,
}

impl Envelope {
    /// Flatten into the engine's internal token view.
    pub fn into_token(self) -> Token {
        Token {
            id: TokenId(self.header.sequence_id),
            rule_version: self.header.rule_base_version,
            service: self.service.service_name,
            operation: self.service.operation,
            attribute_name: self.join_attribute.attribute_name,
            attribute_value: self.join_attribute.attribute_value,
            status: self.join_attribute.status,
            not_after: self.join_attribute.not_after,
            workflow_start_ms: self.monitor_data.process_start_time,
            event_arrival_ms: self.monitor_data.event_arrival_time,
            generator_timestamp_ms: self.monitor_data.event_generator_timestamp,
            source_generator: self.monitor_data.source_event_generator,
            monitor: self.header.monitor_incoming_events,
        }
    }

    pub fn from_token(token: Token) -> Envelope {
        Envelope {
            header: Header {
                sequence_id: token.id.0,
                rule_base_version: token.rule_version,
                monitor_incoming_events: token.monitor,
            },
            service: ServiceSection {
                service_name: token.service,
                operation: token.operation,
            },
            join_attribute: JoinAttribute {
                attribute_name: token.attribute_name,
                attribute_value: token.attribute_value,
                not_after: token.not_after,
                status: token.status,
            },
            monitor_data: MonitorData {
                process_start_time: token.workflow_start_ms,
                event_arrival_time: token.event_arrival_ms,
                event_generator_timestamp: token.generator_timestamp_ms,
                source_event_generator: token.source_generator,
            },
        }
    }
}

impl From<Token> for Envelope {
    fn from(token: Token) -> Envelope {
        Envelope::from_token(token)
    }
}

#[cfg(test)]
#[path = "envelope_tests.rs"]
mod tests;
