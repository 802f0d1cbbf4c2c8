//! Column type descriptor parsing
//!
//! Splits a physical type string such as `int(10) unsigned` into the base
//! type, its length constraint and the unsigned flag. The store is the
//! source of truth for valid types, so anything that does not fit the
//! pattern is passed through untouched.

use once_cell::sync::Lazy;
use regex::Regex;

static UNSIGNED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(.*) unsigned$").expect("unsigned pattern is valid"));

static CONSTRAINED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(.*)\((\d+)\)$").expect("constraint pattern is valid"));

/// A parsed column type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeDescriptor {
    pub field_type: String,
    pub constraint: Option<u32>,
    pub unsigned: bool,
}

/// Parse a raw column type as reported by the store
pub fn parse_type(raw: &str) -> TypeDescriptor {
    let mut remainder = raw;
    let mut unsigned = false;

    if let Some(captures) = UNSIGNED.captures(remainder) {
        if let Some(base) = captures.get(1) {
            remainder = base.as_str();
            unsigned = true;
        }
    }

    let mut constraint = None;
    if let Some(captures) = CONSTRAINED.captures(remainder) {
        // a length too large for u32 is left in the type string
        if let (Some(base), Some(Ok(length))) = (
            captures.get(1),
            captures.get(2).map(|m| m.as_str().parse::<u32>()),
        ) {
            remainder = base.as_str();
            constraint = Some(length);
        }
    }

    TypeDescriptor {
        field_type: remainder.to_string(),
        constraint,
        unsigned,
    }
}
