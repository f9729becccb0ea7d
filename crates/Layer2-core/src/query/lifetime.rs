//! Cache lifetime - Cache-Control 파싱 + stale/max age 결정

use serde::{Deserialize, Serialize};

/// Directives of a `Cache-Control` header that drive caching
///
/// Malformed numeric values are treated as absent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheControl {
    pub no_cache: bool,
    pub max_age: Option<u64>,
    pub stale_while_revalidate: Option<u64>,
}

impl CacheControl {
    pub fn parse(header: &str) -> Self {
        let mut parsed = Self::default();

        for directive in header.split(',') {
            let directive = directive.trim();
            if directive.is_empty() {
                continue;
            }

            let (name, value) = match directive.split_once('=') {
                Some((name, value)) => (name.trim(), Some(value.trim().trim_matches('"'))),
                None => (directive, None),
            };

            match name.to_ascii_lowercase().as_str() {
                "no-cache" => parsed.no_cache = true,
                "max-age" => parsed.max_age = value.and_then(parse_seconds),
                "stale-while-revalidate" => {
                    parsed.stale_while_revalidate = value.and_then(parse_seconds)
                }
                _ => {}
            }
        }

        parsed
    }
}

fn parse_seconds(value: &str) -> Option<u64> {
    value.parse().ok()
}

// ============================================================================
// Cache Lifetime
// ============================================================================

/// `(stale_age, max_age)` in seconds
///
/// An item is fresh for `stale_age` seconds and kept for `max_age`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheAges {
    pub stale_age: u64,
    pub max_age: u64,
}

/// Per-query cache policy: defaults plus optional forced ages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheLifetime {
    pub default_max_age: u64,
    pub default_stale_age: u64,
    #[serde(default)]
    pub forced_max_age: Option<u64>,
    #[serde(default)]
    pub forced_stale_age: Option<u64>,
}

impl Default for CacheLifetime {
    fn default() -> Self {
        Self {
            default_max_age: 300,
            default_stale_age: 60,
            forced_max_age: None,
            forced_stale_age: None,
        }
    }
}

impl CacheLifetime {
    pub fn new(default_max_age: u64, default_stale_age: u64) -> Self {
        Self {
            default_max_age,
            default_stale_age,
            ..Default::default()
        }
    }

    pub fn force_max_age(mut self, secs: u64) -> Self {
        self.forced_max_age = Some(secs);
        self
    }

    pub fn force_stale_age(mut self, secs: u64) -> Self {
        self.forced_stale_age = Some(secs);
        self
    }

    pub fn is_forced(&self) -> bool {
        self.forced_max_age.is_some() || self.forced_stale_age.is_some()
    }

    /// Ages for a response with the given `Cache-Control` header
    ///
    /// `None` means the response must not be cached: `no-cache` was sent and
    /// neither age is forced. Forced ages always win over the header.
    pub fn ages_for(&self, cache_control: Option<&str>) -> Option<CacheAges> {
        let directives = cache_control.map(CacheControl::parse).unwrap_or_default();

        if directives.no_cache && !self.is_forced() {
            return None;
        }

        Some(CacheAges {
            stale_age: self
                .forced_stale_age
                .or(directives.stale_while_revalidate)
                .unwrap_or(self.default_stale_age),
            max_age: self
                .forced_max_age
                .or(directives.max_age)
                .unwrap_or(self.default_max_age),
        })
    }
}
