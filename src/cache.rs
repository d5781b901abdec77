use std::ops::Range;

use crate::{
    config::{CacheConfig, Geometry},
    error::{Result, SimError},
    replace::Replace,
    sim::{self, AccessResult},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Addr {
    pub offset: u32,
    pub index: usize,
    pub tag: u32,
}

/// A contiguous run of address bits.
#[derive(Debug, Clone, Copy)]
pub struct BitSection {
    shift: u32,
    mask: u32,
}

impl BitSection {
    pub fn new(shift: u32, bits: u32) -> Self {
        let mask = if bits >= u32::BITS {
            u32::MAX
        } else {
            (1 << bits) - 1
        };
        BitSection { shift, mask }
    }

    pub fn apply(&self, num: u32) -> u32 {
        // A shift by the full word width leaves nothing behind.
        num.checked_shr(self.shift).unwrap_or(0) & self.mask
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Line {
    pub valid: bool,
    pub tag: u32,
    pub offset: u32,

    // Replace Data
    pub inserted: u64,
    pub uses: u64,
}

impl Line {
    pub fn fill(&mut self, addr: &Addr) {
        self.valid = true;
        self.tag = addr.tag;
        self.offset = addr.offset;
    }

    pub fn touch(&mut self, clock: u64) {
        self.inserted = clock;
        self.uses += 1;
    }

    pub fn holds(&self, tag: u32) -> bool {
        self.valid && self.tag == tag
    }
}

#[derive(Debug)]
pub struct Cache<R: Replace> {
    pub(crate) lines: Vec<Line>,
    pub(crate) repl: R,
    geometry: Geometry,
    n_sets: usize,
    n_ways: usize,
    offset_sec: BitSection,
    index_sec: BitSection,
    tag_sec: BitSection,
}

impl<R: Replace> Cache<R> {
    pub fn new(config: &CacheConfig, repl: R) -> Result<Self> {
        let n_lines = config
            .lines()
            .ok_or(SimError::ResourceExhaustion(usize::MAX))?;
        let mut lines = Vec::new();
        lines
            .try_reserve_exact(n_lines)
            .map_err(|_| SimError::ResourceExhaustion(n_lines))?;
        lines.resize_with(n_lines, Line::default);

        let geometry = config.geometry();
        let offset_bits = config.offset_bits();
        let offset_sec = BitSection::new(0, offset_bits);
        let (index_sec, tag_sec) = match geometry {
            // Without an index field the tag starts right above the offset.
            Geometry::FullyAssociative => (
                BitSection::new(offset_bits, 0),
                BitSection::new(offset_bits, u32::BITS),
            ),
            Geometry::DirectMapped | Geometry::SetAssociative => {
                let index_bits = config.sets.ilog2();
                (
                    BitSection::new(offset_bits, index_bits),
                    BitSection::new(offset_bits + index_bits, u32::BITS),
                )
            }
        };

        Ok(Cache {
            lines,
            repl,
            geometry,
            n_sets: config.sets,
            n_ways: config.ways,
            offset_sec,
            index_sec,
            tag_sec,
        })
    }
}

pub trait IsCache {
    fn access(&mut self, addr: Addr, clock: u64) -> AccessResult;
    fn split_addr(&self, addr: u32) -> Addr;
    fn get_set(&self, index: usize) -> Range<usize>;
    fn line(&self, pos: usize) -> &Line;
    fn n_lines(&self) -> usize;
    fn geometry(&self) -> Geometry;

    fn is_direct_mapped(&self) -> bool {
        self.geometry() == Geometry::DirectMapped
    }

    fn is_fully_associative(&self) -> bool {
        self.geometry() == Geometry::FullyAssociative
    }

    fn is_set_associative(&self) -> bool {
        self.geometry() == Geometry::SetAssociative
    }
}

impl<R: Replace> IsCache for Cache<R> {
    fn access(&mut self, addr: Addr, clock: u64) -> AccessResult {
        sim::process(self, addr, clock)
    }

    fn split_addr(&self, addr: u32) -> Addr {
        let offset = self.offset_sec.apply(addr);
        let index = self.index_sec.apply(addr) as usize;
        let tag = self.tag_sec.apply(addr);
        Addr { offset, index, tag }
    }

    fn get_set(&self, index: usize) -> Range<usize> {
        match self.geometry {
            Geometry::FullyAssociative => 0..self.n_ways,
            Geometry::DirectMapped | Geometry::SetAssociative => {
                debug_assert!(index < self.n_sets);
                index * self.n_ways..(index + 1) * self.n_ways
            }
        }
    }

    fn line(&self, pos: usize) -> &Line {
        &self.lines[pos]
    }

    fn n_lines(&self) -> usize {
        self.lines.len()
    }

    fn geometry(&self) -> Geometry {
        self.geometry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::PolicyKind, replace::lru::LruLike};

    fn cache(sets: usize, block_size: usize, ways: usize) -> Cache<LruLike> {
        let config = CacheConfig::new(sets, block_size, ways, PolicyKind::LruLike).unwrap();
        Cache::new(&config, LruLike::new()).unwrap()
    }

    #[test]
    fn bit_section() {
        assert_eq!(BitSection::new(0, 2).apply(0b1111), 0b11);
        assert_eq!(BitSection::new(2, 3).apply(0b1_0110_1100), 0b011);
        assert_eq!(BitSection::new(32, 32).apply(u32::MAX), 0);
        assert_eq!(BitSection::new(4, 32).apply(0xABCD_1234), 0x0ABC_D123);
        assert_eq!(BitSection::new(4, 0).apply(0xFFFF_FFFF), 0);
    }

    #[test]
    fn split_direct_mapped() {
        let c = cache(4, 4, 1);
        assert_eq!(
            c.split_addr(0x0000_0040),
            Addr {
                offset: 0,
                index: 0,
                tag: 4
            }
        );
        assert_eq!(
            c.split_addr(0x0000_0037),
            Addr {
                offset: 3,
                index: 1,
                tag: 3
            }
        );
    }

    #[test]
    fn split_fully_associative() {
        let c = cache(1, 4, 2);
        let addr = c.split_addr(0x0000_0123);
        assert_eq!(addr.offset, 3);
        assert_eq!(addr.index, 0);
        assert_eq!(addr.tag, 0x0000_0123 >> 2);
    }

    #[test]
    fn split_reassembles() {
        for (sets, block_size, ways) in [(4, 4, 1), (256, 4, 1), (16, 64, 4), (2, 1, 2)] {
            let c = cache(sets, block_size, ways);
            let offset_bits = block_size.ilog2();
            let index_bits = sets.ilog2();
            for address in [0u32, 1, 0x40, 0xDEAD_BEEF, 0x8000_0001, u32::MAX] {
                let a = c.split_addr(address);
                let rebuilt = a.offset
                    | (a.index as u32) << offset_bits
                    | a.tag.checked_shl(offset_bits + index_bits).unwrap_or(0);
                assert_eq!(rebuilt, address, "geometry {sets}x{block_size}x{ways}");
            }
        }
    }

    #[test]
    fn wide_geometry_has_empty_tag() {
        let c = cache(1 << 16, 1 << 16, 1);
        let a = c.split_addr(0xFFFF_FFFF);
        assert_eq!(a.offset, 0xFFFF);
        assert_eq!(a.index, 0xFFFF);
        assert_eq!(a.tag, 0);
    }

    #[test]
    fn sets() {
        let dm = cache(8, 4, 1);
        assert!(dm.is_direct_mapped());
        assert_eq!(dm.get_set(5), 5..6);

        let fa = cache(1, 4, 8);
        assert!(fa.is_fully_associative());
        assert_eq!(fa.get_set(0), 0..8);

        let sa = cache(8, 4, 4);
        assert!(sa.is_set_associative());
        assert_eq!(sa.get_set(3), 12..16);
        assert_eq!(sa.n_lines(), 32);
        assert!(!sa.line(12).valid);
    }
}
