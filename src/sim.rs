use serde::Serialize;

use crate::{
    cache::{Addr, Cache, IsCache},
    error::Result,
    replace::Replace,
    stats::AccessCounters,
    trace::Trace,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MissKind {
    Compulsory,
    Capacity,
    Conflict,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessResult {
    Hit,
    Miss(MissKind),
}

/// Resolves one decoded access against `cache`. `clock` is the running access
/// count, used as the insertion stamp.
pub(crate) fn process<R: Replace>(cache: &mut Cache<R>, addr: Addr, clock: u64) -> AccessResult {
    if cache.is_direct_mapped() {
        direct_mapped(cache, addr)
    } else if cache.is_fully_associative() {
        associative(cache, addr, clock, true, MissKind::Capacity)
    } else {
        debug_assert!(cache.is_set_associative());
        associative(cache, addr, clock, false, MissKind::Conflict)
    }
}

fn direct_mapped<R: Replace>(cache: &mut Cache<R>, addr: Addr) -> AccessResult {
    let pos = cache.get_set(addr.index).start;
    let line = &mut cache.lines[pos];
    if !line.valid {
        line.fill(&addr);
        AccessResult::Miss(MissKind::Compulsory)
    } else if line.tag == addr.tag {
        AccessResult::Hit
    } else {
        line.fill(&addr);
        AccessResult::Miss(MissKind::Conflict)
    }
}

/// Shared by the fully and set associative modes. Only the fully associative
/// cache stamps its replacement data on fills and hits; both stamp on eviction.
fn associative<R: Replace>(
    cache: &mut Cache<R>,
    addr: Addr,
    clock: u64,
    touch: bool,
    evict_kind: MissKind,
) -> AccessResult {
    let set_range = cache.get_set(addr.index);
    let set_slice = &mut cache.lines[set_range];

    for line in set_slice.iter_mut() {
        if !line.valid {
            line.fill(&addr);
            if touch {
                line.touch(clock);
            }
            return AccessResult::Miss(MissKind::Compulsory);
        }
        if line.tag == addr.tag {
            if touch {
                line.touch(clock);
            }
            return AccessResult::Hit;
        }
    }

    // Set is full and nothing matched, evict
    let way = cache.repl.victim(set_slice);
    let victim = &mut set_slice[way];
    log::debug!(
        "evict set {} way {}: tag {:#x} -> {:#x}",
        addr.index,
        way,
        victim.tag,
        addr.tag
    );
    cache.repl.install(victim, &addr, clock);
    debug_assert_eq!(
        set_slice.iter().filter(|l| l.holds(addr.tag)).count(),
        1,
        "tag resident twice in set {}",
        addr.index
    );
    AccessResult::Miss(evict_kind)
}

/// Owns the cache and the counters for a single run.
pub struct Simulator {
    cache: Box<dyn IsCache>,
    counters: AccessCounters,
}

impl Simulator {
    pub fn new(cache: Box<dyn IsCache>) -> Self {
        Simulator {
            cache,
            counters: AccessCounters::default(),
        }
    }

    pub fn access(&mut self, address: u32) -> AccessResult {
        self.counters.accesses += 1;
        let addr = self.cache.split_addr(address);
        let result = self.cache.access(addr, self.counters.accesses);
        log::trace!("{address:#010x} {addr:?} {result:?}");
        self.counters.record(result);
        result
    }

    pub fn run(&mut self, trace: Trace) -> Result<()> {
        for chunk in trace.rec.iter() {
            for address in chunk? {
                self.access(address);
            }
        }
        Ok(())
    }

    pub fn cache(&self) -> &dyn IsCache {
        self.cache.as_ref()
    }

    pub fn counters(&self) -> &AccessCounters {
        &self.counters
    }

    /// Number of lines currently holding a block.
    pub fn resident(&self) -> usize {
        (0..self.cache.n_lines())
            .filter(|&pos| self.cache.line(pos).valid)
            .count()
    }
}
