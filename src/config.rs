use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{
    cache::{Cache, IsCache},
    error::{Result, SimError},
    replace::{fifo::FifoLike, lru::LruLike, random::Random},
};

/// Replacement policy selected by the single-character code on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PolicyKind {
    #[serde(rename = "R", alias = "random")]
    Random,
    #[serde(rename = "F", alias = "fifo")]
    FifoLike,
    #[serde(rename = "L", alias = "lru")]
    LruLike,
}

impl FromStr for PolicyKind {
    type Err = SimError;

    /// Only the first character is significant, so `FIFO` selects `F`.
    fn from_str(s: &str) -> Result<Self> {
        match s.chars().next() {
            Some('R') => Ok(PolicyKind::Random),
            Some('F') => Ok(PolicyKind::FifoLike),
            Some('L') => Ok(PolicyKind::LruLike),
            _ => Err(SimError::InvalidPolicy(s.to_string())),
        }
    }
}

impl fmt::Display for PolicyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let code = match self {
            PolicyKind::Random => "R",
            PolicyKind::FifoLike => "F",
            PolicyKind::LruLike => "L",
        };
        f.write_str(code)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Geometry {
    /// One way per set; the index picks exactly one line.
    DirectMapped,
    /// A single set holding every line; no index field.
    FullyAssociative,
    SetAssociative,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheConfig {
    pub sets: usize,
    pub block_size: usize,
    pub ways: usize,
    pub policy: PolicyKind,
}

impl CacheConfig {
    pub fn new(sets: usize, block_size: usize, ways: usize, policy: PolicyKind) -> Result<Self> {
        let config = CacheConfig {
            sets,
            block_size,
            ways,
            policy,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("nsets", self.sets),
            ("bsize", self.block_size),
            ("assoc", self.ways),
        ] {
            if !value.is_power_of_two() {
                return Err(SimError::InvalidGeometry(format!(
                    "{name} must be a power of two, got {value}"
                )));
            }
        }
        if self.lines().is_none() {
            return Err(SimError::InvalidGeometry(format!(
                "{} sets x {} ways overflows the line count",
                self.sets, self.ways
            )));
        }
        if self.offset_bits() + self.index_bits() > u32::BITS {
            return Err(SimError::InvalidGeometry(format!(
                "{} offset bits and {} index bits exceed a 32-bit address",
                self.offset_bits(),
                self.index_bits()
            )));
        }
        Ok(())
    }

    /// A 1x1 cache counts as direct-mapped.
    pub fn geometry(&self) -> Geometry {
        if self.ways == 1 {
            Geometry::DirectMapped
        } else if self.sets == 1 {
            Geometry::FullyAssociative
        } else {
            Geometry::SetAssociative
        }
    }

    pub fn lines(&self) -> Option<usize> {
        self.sets.checked_mul(self.ways)
    }

    pub fn offset_bits(&self) -> u32 {
        self.block_size.ilog2()
    }

    /// For a fully associative cache this is `log2(ways)`, which only feeds the
    /// tag width bookkeeping; addresses carry no index field in that mode.
    pub fn index_bits(&self) -> u32 {
        if self.sets == 1 {
            self.ways.ilog2()
        } else {
            self.sets.ilog2()
        }
    }

    pub fn tag_bits(&self) -> u32 {
        u32::BITS.saturating_sub(self.offset_bits() + self.index_bits())
    }

    pub fn build(&self, seed: Option<u64>) -> Result<Box<dyn IsCache>> {
        self.validate()?;
        log::info!(
            "cache: {} sets x {} ways, {} byte blocks, {:?}, policy {} (offset {} / index {} / tag {} bits)",
            self.sets,
            self.ways,
            self.block_size,
            self.geometry(),
            self.policy,
            self.offset_bits(),
            self.index_bits(),
            self.tag_bits(),
        );
        Ok(match self.policy {
            PolicyKind::Random => {
                let repl = match seed {
                    Some(seed) => Random::with_seed(seed),
                    None => Random::new(),
                };
                Box::new(Cache::new(self, repl)?) as Box<dyn IsCache>
            }
            PolicyKind::FifoLike => Box::new(Cache::new(self, FifoLike::new())?) as Box<dyn IsCache>,
            PolicyKind::LruLike => Box::new(Cache::new(self, LruLike::new())?) as Box<dyn IsCache>,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn policy_codes() {
        assert_eq!("R".parse::<PolicyKind>().unwrap(), PolicyKind::Random);
        assert_eq!("F".parse::<PolicyKind>().unwrap(), PolicyKind::FifoLike);
        assert_eq!("LRU".parse::<PolicyKind>().unwrap(), PolicyKind::LruLike);
        assert!(matches!(
            "X".parse::<PolicyKind>(),
            Err(SimError::InvalidPolicy(_))
        ));
        assert!("".parse::<PolicyKind>().is_err());
        assert!("f".parse::<PolicyKind>().is_err());
    }

    #[test]
    fn geometry_modes() {
        let dm = CacheConfig::new(4, 4, 1, PolicyKind::Random).unwrap();
        assert_eq!(dm.geometry(), Geometry::DirectMapped);
        let one = CacheConfig::new(1, 4, 1, PolicyKind::Random).unwrap();
        assert_eq!(one.geometry(), Geometry::DirectMapped);
        let fa = CacheConfig::new(1, 4, 8, PolicyKind::Random).unwrap();
        assert_eq!(fa.geometry(), Geometry::FullyAssociative);
        let sa = CacheConfig::new(16, 4, 2, PolicyKind::Random).unwrap();
        assert_eq!(sa.geometry(), Geometry::SetAssociative);
        assert_eq!(sa.lines(), Some(32));
    }

    #[test]
    fn bit_widths() {
        let sa = CacheConfig::new(256, 4, 1, PolicyKind::LruLike).unwrap();
        assert_eq!(sa.offset_bits(), 2);
        assert_eq!(sa.index_bits(), 8);
        assert_eq!(sa.tag_bits(), 22);

        let fa = CacheConfig::new(1, 32, 8, PolicyKind::LruLike).unwrap();
        assert_eq!(fa.offset_bits(), 5);
        assert_eq!(fa.index_bits(), 3);
        assert_eq!(fa.tag_bits(), 24);
    }

    #[test]
    fn rejects_bad_geometry() {
        assert!(matches!(
            CacheConfig::new(3, 4, 1, PolicyKind::Random),
            Err(SimError::InvalidGeometry(_))
        ));
        assert!(CacheConfig::new(4, 0, 1, PolicyKind::Random).is_err());
        assert!(CacheConfig::new(4, 4, 6, PolicyKind::Random).is_err());
        assert!(CacheConfig::new(1 << 20, 1 << 16, 1, PolicyKind::Random).is_err());
    }

    #[test]
    fn oversized_line_count() {
        assert!(matches!(
            CacheConfig::new(2, 4, 1 << 63, PolicyKind::FifoLike),
            Err(SimError::InvalidGeometry(_))
        ));
        // Fits in a usize but not in memory.
        let huge = CacheConfig::new(2, 4, 1 << 58, PolicyKind::FifoLike).unwrap();
        assert!(matches!(
            huge.build(None),
            Err(SimError::ResourceExhaustion(_))
        ));
    }

    #[test]
    fn from_json() {
        let config: CacheConfig = serde_json::from_str(
            r#"{ "sets": 64, "block_size": 16, "ways": 4, "policy": "lru" }"#,
        )
        .unwrap();
        assert_eq!(config, CacheConfig::new(64, 16, 4, PolicyKind::LruLike).unwrap());

        let config: CacheConfig = serde_json::from_str(
            r#"{ "sets": 1, "block_size": 4, "ways": 2, "policy": "F" }"#,
        )
        .unwrap();
        assert_eq!(config.policy, PolicyKind::FifoLike);
    }
}
