use std::fmt;

use serde::Serialize;

use crate::sim::{AccessResult, MissKind};

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct AccessCounters {
    pub accesses: u64,
    pub hits: u64,
    pub compulsory: u64,
    pub capacity: u64,
    pub conflict: u64,
}

impl AccessCounters {
    pub fn record(&mut self, result: AccessResult) {
        match result {
            AccessResult::Hit => self.hits += 1,
            AccessResult::Miss(MissKind::Compulsory) => self.compulsory += 1,
            AccessResult::Miss(MissKind::Capacity) => self.capacity += 1,
            AccessResult::Miss(MissKind::Conflict) => self.conflict += 1,
        }
        debug_assert_eq!(self.hits + self.misses(), self.accesses);
    }

    pub fn misses(&self) -> u64 {
        self.compulsory + self.capacity + self.conflict
    }
}

/// Ratio that reads as zero when nothing was counted.
fn ratio(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64
    }
}

/// Final rates. Per-kind miss rates are relative to the total miss count, not
/// to the number of accesses.
#[derive(Debug, Serialize)]
pub struct CacheStats {
    pub accesses: u64,
    pub hits: u64,
    pub misses: u64,
    pub compulsory: u64,
    pub capacity: u64,
    pub conflict: u64,
    pub hit_rate: f64,
    pub miss_rate: f64,
    pub compulsory_rate: f64,
    pub capacity_rate: f64,
    pub conflict_rate: f64,
}

impl CacheStats {
    pub fn new(counters: &AccessCounters) -> Self {
        let misses = counters.misses();
        let hit_rate = ratio(counters.hits, counters.accesses);
        CacheStats {
            accesses: counters.accesses,
            hits: counters.hits,
            misses,
            compulsory: counters.compulsory,
            capacity: counters.capacity,
            conflict: counters.conflict,
            hit_rate,
            miss_rate: if counters.accesses == 0 { 0.0 } else { 1.0 - hit_rate },
            compulsory_rate: ratio(counters.compulsory, misses),
            capacity_rate: ratio(counters.capacity, misses),
            conflict_rate: ratio(counters.conflict, misses),
        }
    }

    pub fn verbose(&self) -> Verbose<'_> {
        Verbose(self)
    }

    pub fn compact(&self) -> Compact<'_> {
        Compact(self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Verbose,
    Compact,
}

pub struct Verbose<'s>(&'s CacheStats);

impl fmt::Display for Verbose<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = self.0;
        writeln!(f, "Total accesses = {}", s.accesses)?;
        writeln!(f, "Hits = {} ({:.2}%)", s.hits, s.hit_rate * 100.0)?;
        writeln!(f, "Misses = {} ({:.2}%)", s.misses, s.miss_rate * 100.0)?;
        writeln!(
            f,
            "Compulsory misses: {} ({:.2}%)",
            s.compulsory,
            s.compulsory_rate * 100.0
        )?;
        writeln!(
            f,
            "Capacity misses: {} ({:.2}%)",
            s.capacity,
            s.capacity_rate * 100.0
        )?;
        write!(
            f,
            "Conflict misses: {} ({:.2}%)",
            s.conflict,
            s.conflict_rate * 100.0
        )
    }
}

/// `accesses hit_rate miss_rate compulsory capacity conflict`
pub struct Compact<'s>(&'s CacheStats);

impl fmt::Display for Compact<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = self.0;
        write!(
            f,
            "{} {:.4} {:.4} {:.2} {:.2} {:.2}",
            s.accesses,
            s.hit_rate,
            s.miss_rate,
            s.compulsory_rate,
            s.capacity_rate,
            s.conflict_rate
        )
    }
}
