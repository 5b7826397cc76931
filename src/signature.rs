//! A [`Pattern`] plus a cache, invalidated by cache-hint changes, over the
//! address where it was last found.

use std::sync::Mutex;

use crate::cache_hint::CacheHint;
use crate::capability::{CacheHintSource, ReadMemory};
use crate::pattern::{DynamicPattern, Pattern, PatternElement, StaticPattern};

struct ScanCache {
    hint: Option<CacheHint>,
    address: Option<usize>,
}

/// A pattern with a concurrency-safe scan cache, keyed on process identity.
///
/// `Signature<StaticPattern<N>>` and [`DynamicSignature`] (an alias for
/// `Signature<DynamicPattern>`) share this one implementation of the cache
/// state machine described in spec §4.7.
pub struct Signature<P: Pattern> {
    pattern: P,
    cache: Mutex<ScanCache>,
}

/// A [`Signature`] built around a run-time [`DynamicPattern`].
pub type DynamicSignature = Signature<DynamicPattern>;

/// A [`Signature`] built around a compile-time [`StaticPattern`].
pub type StaticSignature<const N: usize> = Signature<StaticPattern<N>>;

impl<P: Pattern> Signature<P> {
    pub fn new(pattern: P) -> Self {
        Self {
            pattern,
            cache: Mutex::new(ScanCache {
                hint: None,
                address: None,
            }),
        }
    }

    pub fn pattern(&self) -> &P {
        &self.pattern
    }

    /// Returns the address of the pattern in `reader`'s address space, or
    /// `None` if not found.
    ///
    /// Per spec §4.7: if the cache holds an address captured under the
    /// reader's current hint, it is returned with no I/O at all. Otherwise
    /// the cache is dropped and a fresh scan is performed, and the result
    /// (found or not) is committed under the hint observed for this call.
    pub fn scan<R: ReadMemory + CacheHintSource>(&self, reader: &R) -> Option<usize> {
        if self.pattern.is_empty() {
            return None;
        }

        let mut cache = self.cache.lock().unwrap_or_else(|e| e.into_inner());
        let hint = reader.get_cache_hint();

        if let (Some(cached_hint), Some(cached_addr)) = (cache.hint, cache.address) {
            if cached_hint == hint {
                return Some(cached_addr);
            }
            log::debug!(
                "signature cache invalidated: hint {cached_hint} -> {hint}, dropping cached address {cached_addr:#x}"
            );
        }

        cache.hint = None;
        cache.address = None;

        let found = scan_primitive(reader, self.pattern.elements());
        match found {
            Some(addr) => {
                cache.hint = Some(hint);
                cache.address = Some(addr);
            }
            None => {
                log::debug!("signature scan found no match under hint {hint}");
            }
        }
        found
    }
}

/// Enumerates regions, reads each in one call, and returns the address of
/// the first byte-and-mask match across regions (region order × offset
/// order). A region that fails to read is skipped, not treated as failure
/// of the whole scan.
fn scan_primitive(reader: &impl ReadMemory, elements: &[PatternElement]) -> Option<usize> {
    let pattern_len = elements.len();
    if pattern_len == 0 {
        return None;
    }

    for region in reader.regions() {
        if region.size < pattern_len {
            continue;
        }
        let bytes = reader.read_bytes(region.base, region.size);
        if bytes.len() != region.size {
            continue;
        }

        'offsets: for start in 0..=(bytes.len() - pattern_len) {
            for (i, element) in elements.iter().enumerate() {
                if !element.is_mask && bytes[start + i] != element.byte {
                    continue 'offsets;
                }
            }
            return Some(region.base + start);
        }
    }

    None
}
