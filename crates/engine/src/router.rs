// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Routing: resolve destinations from the rule base and publish outgoing
//! tokens per node-kind semantics.
//!
//! Destination priority is the `activeService` runtime override, then
//! the `publishes` row. Channel names starting with `ip` resolve through
//! `boundChannel`; the port always comes from the row that supplied the
//! channel.

use crate::error::TokenFault;
use crate::invoker::InvokeError;
use crate::transport::{Destination, TokenPublisher};
use smol_str::SmolStr;
use std::sync::Arc;
use weft_core::{NodeKind, PlaceId, Token, TokenId};
use weft_rules::{active_service, bound_channel, OperationProfile, PublishRow, RuleBase};

/// One outgoing arc that fired.
#[derive(Debug, Clone)]
pub struct ExitArc {
    /// The token as published.
    pub token: Token,
    pub destination: Destination,
    pub to_place: PlaceId,
    /// Decision value on XOR/Gateway arcs.
    pub arc_value: Option<String>,
    /// True when this arc carried a fork child.
    pub forked_child: bool,
}

#[derive(Debug, Default)]
pub struct RouteOutcome {
    pub exits: Vec<ExitArc>,
    /// Set at terminal places; no arcs fire.
    pub terminated: bool,
}

pub struct Router<P> {
    place: PlaceId,
    publisher: Arc<P>,
}

impl<P: TokenPublisher> Router<P> {
    pub fn new(place: PlaceId, publisher: Arc<P>) -> Router<P> {
        Router { place, publisher }
    }

    /// Route one service result. `token` is the continuing token (join
    /// survivor identity already applied).
    pub async fn route(
        &self,
        base: &RuleBase,
        profile: &OperationProfile,
        token: &Token,
        result: &str,
    ) -> Result<RouteOutcome, TokenFault> {
        match profile.node_kind {
            NodeKind::Terminate => Ok(RouteOutcome { exits: Vec::new(), terminated: true }),
            NodeKind::Xor => self.route_xor(base, profile, token, result).await,
            NodeKind::Fork => self.route_fork(base, profile, token, result).await,
            NodeKind::Gateway => self.route_gateway(base, profile, token, result).await,
            _ => self.route_edge(base, profile, token, result).await,
        }
    }

    /// Edge-like kinds: first `publishes` row whose condition holds.
    async fn route_edge(
        &self,
        base: &RuleBase,
        profile: &OperationProfile,
        token: &Token,
        result: &str,
    ) -> Result<RouteOutcome, TokenFault> {
        let row = profile
            .publishes
            .iter()
            .find(|row| condition_holds(&row.condition, result))
            .ok_or_else(|| TokenFault::RoutingConfig {
                reason: format!("no publishes row matches at {}", self.place),
            })?;
        let exit = self
            .publish_arc(base, profile, token, result, PublishTo::from_row(row), token.id, None)
            .await?;
        Ok(RouteOutcome { exits: vec![exit], terminated: false })
    }

    /// Exactly one branch whose decision value matches; rule-row order
    /// breaks ties.
    async fn route_xor(
        &self,
        base: &RuleBase,
        profile: &OperationProfile,
        token: &Token,
        result: &str,
    ) -> Result<RouteOutcome, TokenFault> {
        let row = profile
            .publishes
            .iter()
            .find(|row| xor_matches(row, result))
            .ok_or_else(|| TokenFault::RoutingConfig {
                reason: format!("no XOR branch matches decision {result:?} at {}", self.place),
            })?;
        let exit = self
            .publish_arc(
                base,
                profile,
                token,
                result,
                PublishTo::from_row(row),
                token.id,
                Some(result.to_string()),
            )
            .await?;
        Ok(RouteOutcome { exits: vec![exit], terminated: false })
    }

    /// One child per `meetsCondition` row, branch numbers in row order.
    async fn route_fork(
        &self,
        base: &RuleBase,
        profile: &OperationProfile,
        token: &Token,
        result: &str,
    ) -> Result<RouteOutcome, TokenFault> {
        let targets: Vec<(SmolStr, SmolStr)> = profile
            .guards
            .iter()
            .map(|g| (g.service.clone(), g.operation.clone()))
            .collect();
        self.fork_children(base, profile, token, result, &targets, None).await
    }

    /// The service result is a directive: `FORK:Svc.op,...` or `EDGE:Svc.op`.
    async fn route_gateway(
        &self,
        base: &RuleBase,
        profile: &OperationProfile,
        token: &Token,
        result: &str,
    ) -> Result<RouteOutcome, TokenFault> {
        if let Some(rest) = result.strip_prefix("FORK:") {
            let targets = parse_targets(rest)
                .ok_or_else(|| malformed_directive(result))?;
            return self
                .fork_children(base, profile, token, result, &targets, Some(result.to_string()))
                .await;
        }
        if let Some(rest) = result.strip_prefix("EDGE:") {
            let place = PlaceId::parse(rest.trim()).ok_or_else(|| malformed_directive(result))?;
            let exit = self
                .publish_arc(
                    base,
                    profile,
                    token,
                    result,
                    PublishTo::target(&place, find_row(profile, &place)),
                    token.id,
                    Some(result.to_string()),
                )
                .await?;
            return Ok(RouteOutcome { exits: vec![exit], terminated: false });
        }
        Err(malformed_directive(result))
    }

    async fn fork_children(
        &self,
        base: &RuleBase,
        profile: &OperationProfile,
        token: &Token,
        result: &str,
        targets: &[(SmolStr, SmolStr)],
        arc_value: Option<String>,
    ) -> Result<RouteOutcome, TokenFault> {
        let mut exits = Vec::with_capacity(targets.len());
        for (index, (service, operation)) in targets.iter().enumerate() {
            let branch = index as i32 + 1;
            let child_id = token.id.child(branch).ok_or_else(|| TokenFault::RoutingConfig {
                reason: format!("fork at {} exceeds {} branches", self.place, weft_core::MAX_BRANCH),
            })?;
            let place = PlaceId::new(service.clone(), operation.clone());
            let mut exit = self
                .publish_arc(
                    base,
                    profile,
                    token,
                    result,
                    PublishTo::target(&place, find_row(profile, &place)),
                    child_id,
                    arc_value.clone(),
                )
                .await?;
            exit.forked_child = true;
            exits.push(exit);
        }
        Ok(RouteOutcome { exits, terminated: false })
    }

    /// Publish one token to one destination, deriving the outgoing
    /// attribute name and resolving the channel.
    async fn publish_arc(
        &self,
        base: &RuleBase,
        profile: &OperationProfile,
        token: &Token,
        result: &str,
        to: PublishTo<'_>,
        out_id: TokenId,
        arc_value: Option<String>,
    ) -> Result<ExitArc, TokenFault> {
        let attribute = self.outgoing_attribute(profile, &to.place)?;
        let destination = self.resolve_destination(base, &to)?;
        let out = token.forwarded(
            out_id,
            to.place.service.clone(),
            to.place.operation.clone(),
            attribute,
            result.to_string(),
        );
        self.publisher.publish(&destination, out.clone()).await?;
        Ok(ExitArc {
            token: out,
            destination,
            to_place: to.place.clone(),
            arc_value,
            forked_child: false,
        })
    }

    /// Self-feedback publishes the operation's own canonical input;
    /// external arcs publish its canonical return attribute. Either
    /// lookup missing is fatal for the token.
    fn outgoing_attribute(
        &self,
        profile: &OperationProfile,
        destination: &PlaceId,
    ) -> Result<SmolStr, TokenFault> {
        if destination.service == self.place.service {
            profile.inputs.first().cloned().filter(|s| !s.is_empty()).ok_or_else(|| {
                TokenFault::RoutingConfig {
                    reason: format!("no canonical input for self-feedback at {}", self.place),
                }
            })
        } else if profile.return_attribute.is_empty() {
            Err(TokenFault::RoutingConfig {
                reason: format!("no canonical return attribute at {}", self.place),
            })
        } else {
            Ok(profile.return_attribute.clone())
        }
    }

    fn resolve_destination(
        &self,
        base: &RuleBase,
        to: &PublishTo<'_>,
    ) -> Result<Destination, TokenFault> {
        let override_row =
            active_service(base, to.place.service.as_str(), to.place.operation.as_str())
                .map_err(|e| TokenFault::RoutingConfig { reason: e.to_string() })?;
        let (channel, port) = match override_row {
            Some((channel, port)) => (channel, port),
            None => match to.row {
                Some(row) => (row.channel.clone(), row.port),
                None => {
                    return Err(TokenFault::RoutingConfig {
                        reason: format!("no destination configured for {}", to.place),
                    })
                }
            },
        };
        let channel = if channel.starts_with("ip") {
            bound_channel(base, channel.as_str()).ok_or_else(|| TokenFault::RoutingConfig {
                reason: format!("channel {channel:?} has no bound address"),
            })?
        } else {
            channel
        };
        Ok(Destination { channel, port })
    }
}

/// Where one arc goes: the destination place plus the `publishes` row
/// that configured it (absent when only `activeService` can resolve it).
struct PublishTo<'a> {
    place: PlaceId,
    row: Option<&'a PublishRow>,
}

impl<'a> PublishTo<'a> {
    fn from_row(row: &'a PublishRow) -> PublishTo<'a> {
        PublishTo {
            place: PlaceId::new(row.next_service.clone(), row.next_operation.clone()),
            row: Some(row),
        }
    }

    fn target(place: &PlaceId, row: Option<&'a PublishRow>) -> PublishTo<'a> {
        PublishTo { place: place.clone(), row }
    }
}

fn find_row<'a>(profile: &'a OperationProfile, place: &PlaceId) -> Option<&'a PublishRow> {
    profile
        .publishes
        .iter()
        .find(|row| row.next_service == place.service && row.next_operation == place.operation)
}

fn condition_holds(condition: &str, result: &str) -> bool {
    condition == "true" || condition == result
}

/// A row matches when its decision value equals the result; the literal
/// `"null"` decision falls back to the condition column.
fn xor_matches(row: &PublishRow, result: &str) -> bool {
    if row.decision_value != "null" {
        row.decision_value == result
    } else {
        row.condition == "true"
    }
}

fn parse_targets(list: &str) -> Option<Vec<(SmolStr, SmolStr)>> {
    let mut targets = Vec::new();
    for part in list.split(',') {
        let place = PlaceId::parse(part.trim())?;
        targets.push((place.service, place.operation));
    }
    if targets.is_empty() {
        None
    } else {
        Some(targets)
    }
}

fn malformed_directive(result: &str) -> TokenFault {
    TokenFault::Invocation(InvokeError::Failed(format!(
        "malformed gateway directive {result:?}"
    )))
}

#[cfg(test)]
#[path = "router_tests.rs"]
mod tests;
