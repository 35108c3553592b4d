// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Parser for rule-base fact files.
//!
//! The on-disk syntax is ground facts, one per statement:
//!
//! ```text
//! % routing for opX
//! NodeType("EdgeNode").
//! publishes("SvcY", "true", "opY", "ch-main", "direct", 9401, "null").
//! ```
//!
//! Arguments are double-quoted strings, bare integers, or bare
//! identifiers; `%` starts a comment running to end of line.

use crate::fact::Fact;
use crate::loader::RulesError;
use nom::{
    branch::alt,
    bytes::complete::{take_while, take_while1},
    character::complete::{char, digit1, multispace0},
    combinator::{map, recognize},
    multi::separated_list0,
    sequence::{delimited, pair},
    IResult,
};
use smol_str::SmolStr;

fn identifier(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        take_while1(|c: char| c.is_ascii_alphabetic() || c == '_'),
        take_while(|c: char| c.is_ascii_alphanumeric() || c == '_'),
    ))(input)
}

fn quoted(input: &str) -> IResult<&str, &str> {
    delimited(char('"'), take_while(|c| c != '"'), char('"'))(input)
}

fn argument(input: &str) -> IResult<&str, SmolStr> {
    alt((
        map(quoted, SmolStr::new),
        map(digit1, SmolStr::new),
        map(identifier, SmolStr::new),
    ))(input)
}

fn fact(input: &str) -> IResult<&str, Fact> {
    let (input, relation) = identifier(input)?;
    let (input, _) = multispace0(input)?;
    let (input, args) = delimited(
        char('('),
        separated_list0(char(','), delimited(multispace0, argument, multispace0)),
        char(')'),
    )(input)?;
    let (input, _) = multispace0(input)?;
    let (input, _) = char('.')(input)?;
    Ok((input, Fact { relation: SmolStr::new(relation), args }))
}

/// Skip whitespace and `%` comments.
fn skip_trivia(input: &str) -> &str {
    let mut rest = input;
    loop {
        let trimmed = rest.trim_start();
        if let Some(after) = trimmed.strip_prefix('%') {
            rest = match after.find('\n') {
                Some(pos) => &after[pos + 1..],
                None => "",
            };
        } else {
            return trimmed;
        }
    }
}

/// Parse a whole fact file, preserving fact order.
pub fn parse_facts(input: &str) -> Result<Vec<Fact>, RulesError> {
    let mut facts = Vec::new();
    let mut rest = skip_trivia(input);
    while !rest.is_empty() {
        match fact(rest) {
            Ok((next, parsed)) => {
                facts.push(parsed);
                rest = skip_trivia(next);
            }
            Err(_) => {
                let offset = input.len() - rest.len();
                let line = input[..offset].matches('\n').count() + 1;
                let snippet: String = rest.chars().take(40).collect();
                return Err(RulesError::Parse { line, snippet });
            }
        }
    }
    Ok(facts)
}

#[cfg(test)]
#[path = "parser_tests.rs"]
mod tests;
