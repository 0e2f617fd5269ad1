//! Compressed position index for run-length encoded rows, columns and cells.
//!
//! Each stored run `i` is represented by the logical position of the last slot
//! it covers. Entries are strictly increasing, so the owner of a logical
//! position is found with a lower-bound search.

use crate::common::{Error, Result};
use smallvec::SmallVec;
use std::ops::Range;

/// Cumulative "last position" per stored run.
///
/// Most rows hold a handful of runs, so the entries live inline up to eight
/// runs before spilling to the heap.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PositionIndex {
    last: SmallVec<[usize; 8]>,
}

impl PositionIndex {
    /// An index with no runs
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an index from the repeat count of every run in storage order.
    ///
    /// A repeat of 0 is stored as 1: every stored node covers at least one slot.
    pub fn from_repeats<I: IntoIterator<Item = usize>>(repeats: I) -> Self {
        let mut last = SmallVec::new();
        let mut next = 0usize;
        for repeat in repeats {
            next += repeat.max(1);
            last.push(next - 1);
        }
        Self { last }
    }

    /// Number of stored runs
    pub fn len(&self) -> usize {
        self.last.len()
    }

    pub fn is_empty(&self) -> bool {
        self.last.is_empty()
    }

    /// Number of logical positions covered by all runs
    pub fn logical_count(&self) -> usize {
        self.last.last().map_or(0, |&l| l + 1)
    }

    /// Ordinal of the run covering logical position `p`
    pub fn locate(&self, p: usize) -> Option<usize> {
        let ordinal = self.last.partition_point(|&l| l < p);
        (ordinal < self.last.len()).then_some(ordinal)
    }

    /// Like [`PositionIndex::locate`] but reporting a miss as [`Error::OutOfRange`]
    pub fn try_locate(&self, p: usize) -> Result<usize> {
        self.locate(p).ok_or(Error::OutOfRange {
            position: p,
            len: self.logical_count(),
        })
    }

    /// First logical position covered by run `ordinal`
    pub fn start_of(&self, ordinal: usize) -> usize {
        match ordinal {
            0 => 0,
            _ => self.last[ordinal - 1] + 1,
        }
    }

    /// Number of logical positions covered by run `ordinal`
    pub fn repeat_of(&self, ordinal: usize) -> usize {
        self.last[ordinal] + 1 - self.start_of(ordinal)
    }

    /// Insert a run of `repeat` positions before `ordinal` (appends when
    /// `ordinal == len`). Every following run shifts by `repeat`.
    pub fn insert_run(&mut self, ordinal: usize, repeat: usize) {
        self.splice(ordinal..ordinal, [repeat]);
    }

    /// Remove the run at `ordinal`, returning its repeat count. Following runs
    /// move back by that amount.
    pub fn erase_run(&mut self, ordinal: usize) -> usize {
        let repeat = self.repeat_of(ordinal);
        self.splice(ordinal..ordinal + 1, []);
        repeat
    }

    /// Change the repeat count of one run in place
    pub fn set_repeat(&mut self, ordinal: usize, repeat: usize) {
        self.splice(ordinal..ordinal + 1, [repeat]);
    }

    /// Replace the runs in `range` by runs with the given repeat counts and
    /// renumber everything after them in one pass.
    pub fn splice<I: IntoIterator<Item = usize>>(&mut self, range: Range<usize>, repeats: I) {
        let base = self.start_of(range.start);
        let old_end = match range.end {
            0 => 0,
            end if end > range.start => self.last[end - 1] + 1,
            _ => base,
        };

        let mut next = base;
        let mut replacement: SmallVec<[usize; 8]> = SmallVec::new();
        for repeat in repeats {
            next += repeat.max(1);
            replacement.push(next - 1);
        }

        let mut last: SmallVec<[usize; 8]> =
            SmallVec::with_capacity(self.last.len() - range.len() + replacement.len());
        last.extend_from_slice(&self.last[..range.start]);
        last.extend_from_slice(&replacement);
        // Entries after the range keep their offset from the end of the range.
        last.extend(self.last[range.end..].iter().map(|&l| l - old_end + next));
        self.last = last;
    }

    /// Remove every run
    pub fn clear(&mut self) {
        self.last.clear();
    }

    /// `(start, repeat)` of every run in storage order
    pub fn runs(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.last.iter().scan(0usize, |start, &l| {
            let run = (*start, l + 1 - *start);
            *start = l + 1;
            Some(run)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn repeats(index: &PositionIndex) -> Vec<usize> {
        index.runs().map(|(_, r)| r).collect()
    }

    #[test]
    fn test_locate_lower_bound() {
        let index = PositionIndex::from_repeats([3, 1, 5]);
        assert_eq!(index.logical_count(), 9);
        assert_eq!(index.locate(0), Some(0));
        assert_eq!(index.locate(2), Some(0));
        assert_eq!(index.locate(3), Some(1));
        assert_eq!(index.locate(4), Some(2));
        assert_eq!(index.locate(8), Some(2));
        assert_eq!(index.locate(9), None);
        assert!(matches!(
            index.try_locate(9),
            Err(Error::OutOfRange { position: 9, len: 9 })
        ));
    }

    #[test]
    fn test_empty_index() {
        let index = PositionIndex::new();
        assert!(index.is_empty());
        assert_eq!(index.logical_count(), 0);
        assert_eq!(index.locate(0), None);
    }

    #[test]
    fn test_insert_and_erase_runs() {
        let mut index = PositionIndex::from_repeats([2, 2]);
        index.insert_run(1, 3);
        assert_eq!(repeats(&index), [2, 3, 2]);
        assert_eq!(index.start_of(2), 5);
        assert_eq!(index.logical_count(), 7);

        index.insert_run(3, 1);
        assert_eq!(repeats(&index), [2, 3, 2, 1]);

        assert_eq!(index.erase_run(1), 3);
        assert_eq!(repeats(&index), [2, 2, 1]);
        assert_eq!(index.logical_count(), 5);

        index.insert_run(0, 4);
        assert_eq!(index.start_of(1), 4);
        assert_eq!(index.logical_count(), 9);
    }

    #[test]
    fn test_splice_shrinks_and_grows() {
        let mut index = PositionIndex::from_repeats([10, 4]);
        index.splice(0..1, [5, 1, 4]);
        assert_eq!(repeats(&index), [5, 1, 4, 4]);
        assert_eq!(index.logical_count(), 14);

        index.splice(1..3, [1]);
        assert_eq!(repeats(&index), [5, 1, 4]);
        assert_eq!(index.locate(6), Some(2));

        index.set_repeat(0, 1);
        assert_eq!(repeats(&index), [1, 1, 4]);
        assert_eq!(index.logical_count(), 6);
    }

    #[test]
    fn test_zero_repeat_counts_as_one() {
        let index = PositionIndex::from_repeats([0, 2]);
        assert_eq!(repeats(&index), [1, 2]);
    }
}
