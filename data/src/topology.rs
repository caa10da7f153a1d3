//! Position of a rank within the linear decomposition chain

/// Position of a rank in the chain of cooperating ranks
///
/// Ranks only ever talk to their immediate neighbors in the chain, i.e. the
/// ranks at `position - 1` and `position + 1` when those exist.
#[derive(Copy, Clone, Debug, Eq, Hash, PartialEq)]
pub struct Topology {
    /// 0-based position of this rank
    position: usize,

    /// Total number of ranks in the chain
    count: usize,
}
//
impl Topology {
    /// Describe the rank at `position` in a chain of `count` ranks
    ///
    /// # Panics
    ///
    /// If `position` is not smaller than `count`.
    pub fn new(position: usize, count: usize) -> Self {
        assert!(
            position < count,
            "rank position {position} is out of chain bounds 0..{count}"
        );
        Self { position, count }
    }

    /// Topology of a run that has a single rank
    pub fn single() -> Self {
        Self::new(0, 1)
    }

    /// Position of this rank in the chain
    pub fn position(&self) -> usize {
        self.position
    }

    /// Number of ranks in the chain
    pub fn count(&self) -> usize {
        self.count
    }

    /// Truth that this rank owns the leading edge of the global domain
    pub fn is_first(&self) -> bool {
        self.position == 0
    }

    /// Truth that this rank owns the trailing edge of the global domain
    pub fn is_last(&self) -> bool {
        self.position == self.count - 1
    }

    /// Neighbor with a lower position, if any
    pub fn lower(&self) -> Option<usize> {
        self.position.checked_sub(1)
    }

    /// Neighbor with a higher position, if any
    pub fn higher(&self) -> Option<usize> {
        (!self.is_last()).then_some(self.position + 1)
    }
}
//
impl Default for Topology {
    fn default() -> Self {
        Self::single()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chain_ends_have_one_neighbor() {
        let first = Topology::new(0, 3);
        assert!(first.is_first() && !first.is_last());
        assert_eq!((first.lower(), first.higher()), (None, Some(1)));

        let middle = Topology::new(1, 3);
        assert!(!middle.is_first() && !middle.is_last());
        assert_eq!((middle.lower(), middle.higher()), (Some(0), Some(2)));

        let last = Topology::new(2, 3);
        assert!(last.is_last());
        assert_eq!((last.lower(), last.higher()), (Some(1), None));
    }

    #[test]
    fn single_rank_has_no_neighbor() {
        let single = Topology::default();
        assert!(single.is_first() && single.is_last());
        assert_eq!((single.lower(), single.higher()), (None, None));
    }

    #[test]
    #[should_panic]
    fn position_must_be_in_chain() {
        Topology::new(2, 2);
    }
}
