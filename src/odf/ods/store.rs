//! Run-length store of rows, columns or cells.
//!
//! [`RunStore`] keeps the stored nodes and their [`PositionIndex`] in lockstep.
//! Writes at a logical position split the owning run into an untouched head,
//! the new node and an untouched tail, so positions outside the written range
//! keep their content.

use crate::common::{Error, Result};
use crate::odf::ods::index::PositionIndex;
use std::ops::{Deref, DerefMut};
use tracing::trace;

/// A stored node that can stand for several identical logical positions.
pub trait Repeated: Clone {
    /// Number of logical positions covered, at least 1
    fn repeated(&self) -> usize;

    /// Change the number of covered positions; values below 1 mean 1
    fn set_repeated(&mut self, repeat: usize);

    /// Copy of this node covering exactly `repeat` positions
    fn with_repeated(&self, repeat: usize) -> Self {
        let mut copy = self.clone();
        copy.set_repeated(repeat);
        copy
    }
}

/// Stored runs plus the index mapping logical positions to them.
#[derive(Debug, Clone, PartialEq)]
pub struct RunStore<T> {
    items: Vec<T>,
    index: PositionIndex,
}

impl<T> Default for RunStore<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            index: PositionIndex::new(),
        }
    }
}

impl<T: Repeated> RunStore<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the store from stored nodes in document order
    pub fn from_items(items: Vec<T>) -> Self {
        let index = PositionIndex::from_repeats(items.iter().map(Repeated::repeated));
        Self { items, index }
    }

    /// Logical length
    pub fn len(&self) -> usize {
        self.index.logical_count()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Number of stored runs
    pub fn run_count(&self) -> usize {
        self.items.len()
    }

    /// The position index
    pub fn index(&self) -> &PositionIndex {
        &self.index
    }

    /// Stored runs in order
    pub fn runs(&self) -> &[T] {
        &self.items
    }

    /// Stored runs with the first logical position each one covers
    pub fn iter_runs(&self) -> impl Iterator<Item = (usize, &T)> {
        self.index.runs().map(|(start, _)| start).zip(self.items.iter())
    }

    /// Every logical position in order; a run of `n` yields its node `n` times
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.items
            .iter()
            .flat_map(|item| std::iter::repeat_n(item, item.repeated()))
    }

    /// Ordinal of the run covering `p` and the offset of `p` inside it
    pub fn locate(&self, p: usize) -> Result<(usize, usize)> {
        let ordinal = self.index.try_locate(p)?;
        Ok((ordinal, p - self.index.start_of(ordinal)))
    }

    /// The run covering logical position `p`
    pub fn get(&self, p: usize) -> Option<&T> {
        self.index.locate(p).map(|ordinal| &self.items[ordinal])
    }

    /// Overwrite the positions `[p, p + node.repeated())` with `node`.
    ///
    /// The run covering `p` keeps its head and tail. When the node is longer
    /// than the rest of that run, the following runs are shrunk or consumed
    /// until the overrun is absorbed; past the last run the store grows.
    pub fn set(&mut self, p: usize, node: T) -> Result<()> {
        let (ordinal, before) = self.locate(p)?;
        let original = &self.items[ordinal];
        let repeat_old = original.repeated();
        let repeat_new = node.repeated();
        let after = repeat_old as isize - before as isize - repeat_new as isize;

        let mut replacement = Vec::with_capacity(3);
        if before >= 1 {
            replacement.push(original.with_repeated(before));
        }
        let tail = (after >= 1).then(|| original.with_repeated(after as usize));
        replacement.push(node);
        replacement.extend(tail);

        let mut end = ordinal + 1;
        let mut overrun = if after < 0 { after.unsigned_abs() } else { 0 };
        while overrun > 0 && end < self.items.len() {
            let repeat = self.items[end].repeated();
            if repeat <= overrun {
                overrun -= repeat;
            } else {
                replacement.push(self.items[end].with_repeated(repeat - overrun));
                overrun = 0;
            }
            end += 1;
        }

        trace!(
            position = p,
            runs_replaced = end - ordinal,
            runs_inserted = replacement.len(),
            "run store set"
        );
        self.splice(ordinal..end, replacement)
    }

    /// Insert `node` before logical position `p`; `p == len()` appends.
    /// Everything from `p` on shifts by `node.repeated()` positions.
    pub fn insert(&mut self, p: usize, node: T) -> Result<()> {
        let len = self.len();
        if p == len {
            self.append(node);
            return Ok(());
        }
        if p > len {
            return Err(Error::OutOfRange { position: p, len });
        }

        let (ordinal, before) = self.locate(p)?;
        if before == 0 {
            return self.splice(ordinal..ordinal, vec![node]);
        }

        let original = &self.items[ordinal];
        let head = original.with_repeated(before);
        let tail = original.with_repeated(original.repeated() - before);
        trace!(position = p, ordinal, "run store insert splits run");
        self.splice(ordinal..ordinal + 1, vec![head, node, tail])
    }

    /// Remove logical position `p`; the owning run shrinks by one and
    /// disappears when it reaches zero.
    pub fn delete(&mut self, p: usize) -> Result<()> {
        let (ordinal, _) = self.locate(p)?;
        let repeat = self.items[ordinal].repeated();
        if repeat > 1 {
            self.items[ordinal].set_repeated(repeat - 1);
            self.index.set_repeat(ordinal, repeat - 1);
        } else {
            self.items.remove(ordinal);
            self.index.erase_run(ordinal);
        }
        self.check()
    }

    /// Add a run after the last one
    pub fn append(&mut self, node: T) {
        let ordinal = self.items.len();
        self.index.insert_run(ordinal, node.repeated());
        self.items.push(node);
    }

    /// Make position `p` a run of its own and return it for in-place editing.
    ///
    /// Changing the repeat of the returned run resizes the store: the index
    /// picks up the new count when the guard is dropped.
    pub fn isolate(&mut self, p: usize) -> Result<RunMut<'_, T>> {
        let ordinal = self.isolate_ordinal(p)?;
        Ok(RunMut {
            store: self,
            ordinal,
        })
    }

    /// Like [`RunStore::isolate`] for callers that leave the repeat alone
    pub(crate) fn isolate_in_place(&mut self, p: usize) -> Result<&mut T> {
        let ordinal = self.isolate_ordinal(p)?;
        Ok(&mut self.items[ordinal])
    }

    fn isolate_ordinal(&mut self, p: usize) -> Result<usize> {
        let (ordinal, before) = self.locate(p)?;
        let repeat = self.items[ordinal].repeated();
        if repeat == 1 {
            return Ok(ordinal);
        }

        let original = &self.items[ordinal];
        let mut replacement = Vec::with_capacity(3);
        if before >= 1 {
            replacement.push(original.with_repeated(before));
        }
        replacement.push(original.with_repeated(1));
        if repeat - before > 1 {
            replacement.push(original.with_repeated(repeat - before - 1));
        }
        self.splice(ordinal..ordinal + 1, replacement)?;
        Ok(ordinal + usize::from(before >= 1))
    }

    /// Drop every position at or after `len`
    pub fn truncate(&mut self, len: usize) {
        if len >= self.len() {
            return;
        }
        if len == 0 {
            self.clear();
            return;
        }
        if let Some(ordinal) = self.index.locate(len - 1) {
            let keep = len - self.index.start_of(ordinal);
            self.items.truncate(ordinal + 1);
            self.items[ordinal].set_repeated(keep);
            self.reindex();
        }
    }

    /// Remove every run
    pub fn clear(&mut self) {
        self.items.clear();
        self.index.clear();
    }

    /// Remove and return the last run
    pub fn pop_run(&mut self) -> Option<T> {
        let item = self.items.pop()?;
        self.index.erase_run(self.items.len());
        Some(item)
    }

    /// Edit every stored run in place, then re-read the repeat counts.
    /// Runs edited before a failing one keep their edits.
    pub fn edit_runs<F: FnMut(&mut T) -> Result<()>>(&mut self, mut edit: F) -> Result<()> {
        let outcome = self.items.iter_mut().try_for_each(&mut edit);
        self.reindex();
        outcome
    }

    /// Infallible form of [`RunStore::edit_runs`]
    pub fn for_each_run_mut<F: FnMut(&mut T)>(&mut self, edit: F) {
        self.items.iter_mut().for_each(edit);
        self.reindex();
    }

    fn reindex(&mut self) {
        self.index = PositionIndex::from_repeats(self.items.iter().map(Repeated::repeated));
    }

    /// Merge adjacent runs that compare equal once their repeat is ignored
    pub fn coalesce(&mut self)
    where
        T: PartialEq,
    {
        let mut merged: Vec<T> = Vec::with_capacity(self.items.len());
        for item in self.items.drain(..) {
            match merged.last_mut() {
                Some(last) if last.with_repeated(1) == item.with_repeated(1) => {
                    let repeat = last.repeated() + item.repeated();
                    last.set_repeated(repeat);
                },
                _ => merged.push(item),
            }
        }
        self.index = PositionIndex::from_repeats(merged.iter().map(Repeated::repeated));
        self.items = merged;
    }

    /// Verify that the index and the stored nodes describe the same runs
    pub fn check(&self) -> Result<()> {
        if self.items.len() != self.index.len() {
            return Err(Error::StructuralInconsistency(format!(
                "{} stored runs but {} index entries",
                self.items.len(),
                self.index.len()
            )));
        }
        for (ordinal, item) in self.items.iter().enumerate() {
            if item.repeated() != self.index.repeat_of(ordinal) {
                return Err(Error::StructuralInconsistency(format!(
                    "run {} repeats {} times but the index says {}",
                    ordinal,
                    item.repeated(),
                    self.index.repeat_of(ordinal)
                )));
            }
        }
        Ok(())
    }

    fn splice(&mut self, range: std::ops::Range<usize>, replacement: Vec<T>) -> Result<()> {
        self.index
            .splice(range.clone(), replacement.iter().map(Repeated::repeated));
        self.items.splice(range, replacement);
        self.check()
    }
}

/// A stored run borrowed for editing.
///
/// Dropping the guard writes the run's repeat back into the index, so a
/// `set_repeated` through the guard grows or shrinks the store.
#[derive(Debug)]
pub struct RunMut<'a, T: Repeated> {
    store: &'a mut RunStore<T>,
    ordinal: usize,
}

impl<T: Repeated> RunMut<'_, T> {
    /// Ordinal of the run among the stored runs
    pub fn ordinal(&self) -> usize {
        self.ordinal
    }
}

impl<T: Repeated> Deref for RunMut<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.store.items[self.ordinal]
    }
}

impl<T: Repeated> DerefMut for RunMut<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.store.items[self.ordinal]
    }
}

impl<T: Repeated> Drop for RunMut<'_, T> {
    fn drop(&mut self) {
        let repeat = self.store.items[self.ordinal].repeated();
        if repeat != self.store.index.repeat_of(self.ordinal) {
            trace!(ordinal = self.ordinal, repeat, "run repeat changed in place");
            self.store.index.set_repeat(self.ordinal, repeat);
        }
    }
}

impl<T: Repeated> FromIterator<T> for RunStore<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self::from_items(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Run {
        label: char,
        repeat: usize,
    }

    impl Repeated for Run {
        fn repeated(&self) -> usize {
            self.repeat
        }

        fn set_repeated(&mut self, repeat: usize) {
            self.repeat = repeat.max(1);
        }
    }

    fn run(label: char, repeat: usize) -> Run {
        Run { label, repeat }
    }

    fn expand(store: &RunStore<Run>) -> String {
        store.iter().map(|r| r.label).collect()
    }

    fn store(runs: &[(char, usize)]) -> RunStore<Run> {
        runs.iter().map(|&(c, n)| run(c, n)).collect()
    }

    #[test]
    fn test_set_inside_run_splits_head_and_tail() {
        let mut s = store(&[('a', 10)]);
        s.set(5, run('b', 1)).unwrap();
        assert_eq!(expand(&s), "aaaaabaaaa");
        assert_eq!(s.run_count(), 3);
        assert_eq!(s.runs()[0].repeat, 5);
        assert_eq!(s.runs()[2].repeat, 4);
    }

    #[test]
    fn test_set_at_run_boundaries() {
        let mut s = store(&[('a', 3), ('c', 2)]);
        s.set(0, run('x', 1)).unwrap();
        assert_eq!(expand(&s), "xaacc");
        s.set(2, run('y', 1)).unwrap();
        assert_eq!(expand(&s), "xaycc");
        s.set(4, run('z', 1)).unwrap();
        assert_eq!(expand(&s), "xaycz");
        assert_eq!(s.len(), 5);
    }

    #[test]
    fn test_set_overrun_absorbs_following_runs() {
        let mut s = store(&[('a', 2), ('b', 2), ('c', 3)]);
        s.set(1, run('x', 4)).unwrap();
        assert_eq!(expand(&s), "axxxxcc");
        assert_eq!(s.run_count(), 3);

        let mut s = store(&[('a', 2), ('b', 1)]);
        s.set(1, run('x', 4)).unwrap();
        assert_eq!(expand(&s), "axxxx");
        assert_eq!(s.len(), 5);
    }

    #[test]
    fn test_set_out_of_range() {
        let mut s = store(&[('a', 2)]);
        assert!(matches!(s.set(2, run('x', 1)), Err(Error::OutOfRange { .. })));
        assert_eq!(expand(&s), "aa");
    }

    #[test]
    fn test_insert_splits_run() {
        let mut s = store(&[('a', 4)]);
        s.insert(2, run('x', 1)).unwrap();
        assert_eq!(expand(&s), "aaxaa");
        s.insert(0, run('y', 2)).unwrap();
        assert_eq!(expand(&s), "yyaaxaa");
        s.insert(7, run('z', 1)).unwrap();
        assert_eq!(expand(&s), "yyaaxaaz");
        assert!(s.insert(9, run('q', 1)).is_err());
    }

    #[test]
    fn test_delete_shrinks_then_removes() {
        let mut s = store(&[('a', 2), ('b', 1), ('c', 1)]);
        s.delete(0).unwrap();
        assert_eq!(expand(&s), "abc");
        assert_eq!(s.run_count(), 3);
        s.delete(1).unwrap();
        assert_eq!(expand(&s), "ac");
        assert_eq!(s.run_count(), 2);
        s.delete(1).unwrap();
        s.delete(0).unwrap();
        assert!(s.is_empty());
        assert!(s.delete(0).is_err());
    }

    #[test]
    fn test_isolate_makes_singleton() {
        let mut s = store(&[('a', 5)]);
        s.isolate(2).unwrap().label = 'x';
        assert_eq!(expand(&s), "aaxaa");
        s.isolate(0).unwrap().label = 'y';
        assert_eq!(expand(&s), "yaxaa");
        s.isolate(4).unwrap().label = 'z';
        assert_eq!(expand(&s), "yaxaz");
        s.check().unwrap();
    }

    #[test]
    fn test_isolate_repeat_change_resizes_store() {
        let mut s = store(&[('a', 3), ('b', 2)]);
        s.isolate(1).unwrap().set_repeated(4);
        assert_eq!(expand(&s), "aaaaaabb");
        assert_eq!(s.len(), 8);
        s.check().unwrap();

        s.isolate(7).unwrap().set_repeated(1);
        s.isolate(0).unwrap().label = 'x';
        assert_eq!(expand(&s), "xaaaaabb");
        s.set(6, run('y', 1)).unwrap();
        assert_eq!(expand(&s), "xaaaaayb");
    }

    #[test]
    fn test_for_each_run_mut_reindexes() {
        let mut s = store(&[('a', 1), ('b', 1)]);
        s.for_each_run_mut(|r| r.repeat = 2);
        assert_eq!(expand(&s), "aabb");
        s.check().unwrap();
    }

    #[test]
    fn test_truncate_and_coalesce() {
        let mut s = store(&[('a', 3), ('b', 3)]);
        s.truncate(4);
        assert_eq!(expand(&s), "aaab");
        s.truncate(10);
        assert_eq!(s.len(), 4);

        let mut s = store(&[('a', 1), ('a', 2), ('b', 1), ('a', 1)]);
        s.coalesce();
        assert_eq!(s.run_count(), 3);
        assert_eq!(expand(&s), "aaaba");

        s.truncate(0);
        assert!(s.is_empty());
    }

    #[test]
    fn test_check_detects_divergence() {
        let mut s = store(&[('a', 3)]);
        s.items[0].repeat = 2;
        assert!(matches!(s.check(), Err(Error::StructuralInconsistency(_))));
        s.edit_runs(|_| Ok(())).unwrap();
        s.check().unwrap();
    }
}
