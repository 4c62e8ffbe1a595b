//! Glyph identity cache.
//!
//! The renderer hands the surface stable glyph ids so the host can cache
//! rasterizations per id instead of per draw call. Identity is the full
//! visual key: character, resolved foreground, bold, and font size. The
//! cache is bounded; hitting the bound clears it wholesale, and the caller
//! must then invalidate everything drawn with old ids.

use std::collections::HashMap;

use emberterm_core::Rgb;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GlyphKey {
    pub ch: char,
    pub fg: Rgb,
    pub bold: bool,
    pub font_px: u16,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GlyphCacheStats {
    pub hits: u64,
    pub misses: u64,
    pub clears: u64,
}

#[derive(Debug)]
pub struct GlyphCache {
    map: HashMap<GlyphKey, u32>,
    next_id: u32,
    capacity: usize,
    stats: GlyphCacheStats,
}

impl GlyphCache {
    /// `capacity` 0 falls back to a single-entry cache rather than dividing
    /// by zero on every insert.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            map: HashMap::new(),
            next_id: 0,
            capacity: capacity.max(1),
            stats: GlyphCacheStats::default(),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.map.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    #[must_use]
    pub fn stats(&self) -> GlyphCacheStats {
        self.stats
    }

    /// The id for `key`, allocating on miss. Returns `(id, cleared)`;
    /// `cleared` means the cache was wholesale-evicted to make room and all
    /// previously issued ids are invalid.
    pub fn resolve(&mut self, key: GlyphKey) -> (u32, bool) {
        if let Some(&id) = self.map.get(&key) {
            self.stats.hits += 1;
            return (id, false);
        }
        self.stats.misses += 1;
        let mut cleared = false;
        if self.map.len() >= self.capacity {
            self.map.clear();
            self.stats.clears += 1;
            cleared = true;
        }
        let id = self.next_id;
        self.next_id = self.next_id.wrapping_add(1);
        self.map.insert(key, id);
        (id, cleared)
    }

    pub fn clear(&mut self) {
        self.map.clear();
        self.stats.clears += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(ch: char) -> GlyphKey {
        GlyphKey {
            ch,
            fg: Rgb::new(255, 255, 255),
            bold: false,
            font_px: 14,
        }
    }

    #[test]
    fn repeated_lookups_hit() {
        let mut cache = GlyphCache::new(8);
        let (id1, _) = cache.resolve(key('a'));
        let (id2, cleared) = cache.resolve(key('a'));
        assert_eq!(id1, id2);
        assert!(!cleared);
        assert_eq!(cache.stats().hits, 1);
        assert_eq!(cache.stats().misses, 1);
    }

    #[test]
    fn distinct_styles_are_distinct_glyphs() {
        let mut cache = GlyphCache::new(8);
        let (a, _) = cache.resolve(key('a'));
        let bold = GlyphKey {
            bold: true,
            ..key('a')
        };
        let (b, _) = cache.resolve(bold);
        let red = GlyphKey {
            fg: Rgb::new(255, 0, 0),
            ..key('a')
        };
        let (c, _) = cache.resolve(red);
        assert!(a != b && b != c && a != c);
    }

    #[test]
    fn overflow_clears_wholesale() {
        let mut cache = GlyphCache::new(2);
        cache.resolve(key('a'));
        cache.resolve(key('b'));
        let (_, cleared) = cache.resolve(key('c'));
        assert!(cleared);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.stats().clears, 1);
        // Old entries are gone: 'a' misses again with a fresh id.
        let (_, cleared) = cache.resolve(key('a'));
        assert!(!cleared);
        assert_eq!(cache.stats().misses, 4);
    }

    #[test]
    fn ids_are_never_reused_after_clear() {
        let mut cache = GlyphCache::new(1);
        let (a, _) = cache.resolve(key('a'));
        let (b, _) = cache.resolve(key('b'));
        assert!(b > a);
    }
}
