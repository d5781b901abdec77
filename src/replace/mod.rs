pub mod fifo;
pub mod lru;
pub mod random;

use crate::cache::{Addr, Line};

/// Victim selection for a full set, invoked only once no line is free and
/// none holds the requested tag.
pub trait Replace {
    /// Returns the way within `set` to overwrite.
    fn victim(&mut self, set: &[Line]) -> usize;

    /// Installs `addr` into the victim line and updates its replacement data.
    fn install(&self, line: &mut Line, addr: &Addr, clock: u64);
}

/// Scans `set` for the first line with the largest key. Ties go to the
/// earliest way, since only a strictly greater key moves the choice.
pub(crate) fn max_way(set: &[Line], key: impl Fn(&Line) -> u64) -> usize {
    let Some(first) = set.first() else {
        return 0;
    };
    let mut best = key(first);
    let mut way = 0;
    for (i, line) in set.iter().enumerate().skip(1) {
        let k = key(line);
        if k > best {
            best = k;
            way = i;
        }
    }
    way
}
