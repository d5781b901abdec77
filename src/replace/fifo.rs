use crate::cache::{Addr, Line};

use super::{max_way, Replace};

/// Insertion-order policy. The victim is the line with the *largest* insertion
/// stamp, i.e. the most recently stamped one, not the oldest.
#[derive(Debug, Default)]
pub struct FifoLike {}

impl FifoLike {
    pub fn new() -> Self {
        FifoLike {}
    }
}

impl Replace for FifoLike {
    fn victim(&mut self, set: &[Line]) -> usize {
        max_way(set, |line| line.inserted)
    }

    fn install(&self, line: &mut Line, addr: &Addr, clock: u64) {
        line.fill(addr);
        line.inserted = clock;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::replace::tests::lines;

    #[test]
    fn evicts_newest_stamp() {
        let set = lines(&[(1, 9), (4, 0), (2, 0)]);
        assert_eq!(FifoLike::new().victim(&set), 1);
    }

    #[test]
    fn equal_stamps_pick_first() {
        let set = lines(&[(0, 0), (0, 5)]);
        assert_eq!(FifoLike::new().victim(&set), 0);
    }

    #[test]
    fn install_keeps_usage() {
        let mut set = lines(&[(1, 3)]);
        let addr = Addr {
            offset: 0,
            index: 0,
            tag: 77,
        };
        FifoLike::new().install(&mut set[0], &addr, 12);
        assert!(set[0].holds(77));
        assert_eq!(set[0].inserted, 12);
        assert_eq!(set[0].uses, 3);
    }
}
