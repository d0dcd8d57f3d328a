//! Memoization for the two sections spec §4.4 calls out by name: the
//! PII-filtered dialog summary and the personality block. Keyed by content
//! hash with a TTL, grounded on `original_source/memory/context.py`'s
//! `_section_cache`/`_cache_ttl` shape (narrowed to just these two sections,
//! per the Open Question decision in `DESIGN.md`).

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::time::{Duration, Instant};

struct CachedSection {
    content: String,
    built_at: Instant,
    key: u64,
}

/// A single cached section, invalidated either by a changed input hash or by
/// TTL expiry.
pub struct SectionCache {
    ttl: Duration,
    slot: Option<CachedSection>,
}

impl SectionCache {
    /// Default TTL: 5 minutes (spec expansion, `context.py`'s `_cache_ttl`).
    #[must_use]
    pub fn new() -> Self {
        Self { ttl: Duration::from_secs(300), slot: None }
    }

    /// Fetch the cached value for `raw_input`, recomputing via `build` when
    /// the input's hash changed or the TTL has elapsed.
    pub fn get_or_build(&mut self, raw_input: &str, build: impl FnOnce(&str) -> String) -> String {
        let key = hash_str(raw_input);
        let stale = self.slot.as_ref().is_none_or(|cached| cached.key != key || cached.built_at.elapsed() > self.ttl);
        if stale {
            let content = build(raw_input);
            self.slot = Some(CachedSection { content: content.clone(), built_at: Instant::now(), key });
            content
        } else {
            self.slot.as_ref().expect("checked above").content.clone()
        }
    }
}

impl Default for SectionCache {
    fn default() -> Self {
        Self::new()
    }
}

fn hash_str(s: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    s.hash(&mut hasher);
    hasher.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recomputes_only_when_input_changes() {
        use std::cell::Cell;
        let calls = Cell::new(0);
        let mut cache = SectionCache::new();

        let out = cache.get_or_build("hello", |s| {
            calls.set(calls.get() + 1);
            s.to_uppercase()
        });
        assert_eq!(out, "HELLO");

        let out = cache.get_or_build("hello", |s| {
            calls.set(calls.get() + 1);
            s.to_uppercase()
        });
        assert_eq!(out, "HELLO");
        assert_eq!(calls.get(), 1);

        let out = cache.get_or_build("world", |s| {
            calls.set(calls.get() + 1);
            s.to_uppercase()
        });
        assert_eq!(out, "WORLD");
        assert_eq!(calls.get(), 2);
    }
}
