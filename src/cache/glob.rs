//! Glob Pattern Module
//!
//! Compiles invalidation globs where `*` matches any run of characters
//! (including the empty one). Every other character is literal.

use regex::Regex;

use crate::error::{CacheError, CacheResult};

// == Glob Pattern ==
/// A compiled invalidation glob.
#[derive(Debug, Clone)]
pub struct GlobPattern {
    raw: String,
    regex: Regex,
}

impl GlobPattern {
    // == Compile ==
    /// Compiles `pattern` into an anchored matcher.
    pub fn compile(pattern: &str) -> CacheResult<Self> {
        let body = pattern
            .split('*')
            .map(regex::escape)
            .collect::<Vec<_>>()
            .join(".*");

        let regex = Regex::new(&format!("^{}$", body))
            .map_err(|e| CacheError::InvalidRequest(format!("invalid pattern '{}': {}", pattern, e)))?;

        Ok(Self {
            raw: pattern.to_string(),
            regex,
        })
    }

    /// Returns true if `key` matches the whole pattern.
    pub fn matches(&self, key: &str) -> bool {
        self.regex.is_match(key)
    }

    // == Redis Translation ==
    /// Translates the pattern to Redis `MATCH` syntax under `prefix`.
    ///
    /// Redis treats `?`, `[`, `]` and `\` as special, so they are escaped;
    /// `*` keeps its wildcard meaning.
    pub fn to_redis_match(&self, prefix: &str) -> String {
        let mut out = escape_redis_literal(prefix);
        for (i, part) in self.raw.split('*').enumerate() {
            if i > 0 {
                out.push('*');
            }
            out.push_str(&escape_redis_literal(part));
        }
        out
    }
}

fn escape_redis_literal(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '?' | '[' | ']' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
