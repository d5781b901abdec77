use crate::cache::{Addr, Line};

use super::{max_way, Replace};

/// Usage-counter policy. The victim is the line with the *largest* usage
/// count, the inverse of a textbook LRU, and a freshly installed line starts
/// counting from zero again.
#[derive(Debug, Default)]
pub struct LruLike {}

impl LruLike {
    pub fn new() -> Self {
        LruLike {}
    }
}

impl Replace for LruLike {
    fn victim(&mut self, set: &[Line]) -> usize {
        max_way(set, |line| line.uses)
    }

    fn install(&self, line: &mut Line, addr: &Addr, _clock: u64) {
        line.fill(addr);
        line.uses = 0;
    }
}
