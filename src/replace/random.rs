use crate::cache::{Addr, Line};

use super::Replace;

/// Uniformly random victim.
#[derive(Debug)]
pub struct Random {
    rng: fastrand::Rng,
}

impl Random {
    pub fn new() -> Self {
        Random {
            rng: fastrand::Rng::new(),
        }
    }

    pub fn with_seed(seed: u64) -> Self {
        Random {
            rng: fastrand::Rng::with_seed(seed),
        }
    }
}

impl Default for Random {
    fn default() -> Self {
        Self::new()
    }
}

impl Replace for Random {
    fn victim(&mut self, set: &[Line]) -> usize {
        self.rng.usize(0..set.len())
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
    fn stays_in_bounds() {
        let set = lines(&[(0, 0); 4]);
        let mut repl = Random::with_seed(7);
        let mut seen = [false; 4];
        for _ in 0..256 {
            let way = repl.victim(&set);
            assert!(way < 4);
            seen[way] = true;
        }
        assert!(seen.iter().all(|&s| s));
    }

    #[test]
    fn seeded_is_reproducible() {
        let set = lines(&[(0, 0); 8]);
        let mut a = Random::with_seed(42);
        let mut b = Random::with_seed(42);
        for _ in 0..32 {
            assert_eq!(a.victim(&set), b.victim(&set));
        }
    }

    #[test]
    fn install_stamps_insertion() {
        let mut line = Line::default();
        let addr = Addr {
            offset: 1,
            index: 0,
            tag: 9,
        };
        Random::default().install(&mut line, &addr, 5);
        assert!(line.holds(9));
        assert_eq!(line.offset, 1);
        assert_eq!(line.inserted, 5);
        assert_eq!(line.uses, 0);
    }
}
