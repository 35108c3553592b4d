// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! weft-rules: Versioned rule bases and the query contract over them.
//!
//! A rule base is a set of ground facts loaded from one operation's
//! `Service.ruleml` file. The orchestrator never interprets the file
//! itself; it binds variables in single-relation patterns and reads the
//! solution rows, or uses the typed [`OperationProfile`] derived from
//! those same queries.

mod base;
mod fact;
mod loader;
mod parser;
mod profile;

pub use base::RuleBase;
pub use fact::{Bindings, Fact, Pattern, Term};
pub use loader::{load_rule_base, rule_file_path, RulesError};
pub use profile::{active_service, bound_channel, GuardRow, InputMode, OperationProfile, PublishRow};
