//! Service name rules

use crate::{Error, Result};
use regex::Regex;
use std::sync::OnceLock;

fn service_name_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"^[a-z0-9_-]+$").ok())
        .as_ref()
}

/// Service names key breakers and monitoring, so they are restricted to
/// lowercase ascii, digits, `-` and `_`.
pub fn validate_service_name(name: &str) -> Result<()> {
    if service_name_pattern().is_some_and(|pattern| pattern.is_match(name)) {
        Ok(())
    } else {
        Err(Error::InvalidInput(format!(
            "\"{}\" is not a valid service name, expected [a-z0-9-_]+",
            name
        )))
    }
}
