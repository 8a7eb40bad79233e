use crate::error::{Error, Result};

//<<<<>>>><<>><><<>><<<*>>><<>><><<>><<<<>>>>

#[derive(Clone, Debug, PartialEq, Eq)]
struct IndexedValue<T> {
    alternate_index: usize,
    value: T,
}

/// A list addressed by caller-supplied, possibly sparse indices.
///
/// Entries are kept sorted by alternate index. Inserting at `k` shifts every
/// entry at `>= k` up by the inserted span, removing shifts every later entry
/// down. Gaps are allowed and hold no entries. Several entries may share an
/// index after [`replace_alternate_index`](Self::replace_alternate_index);
/// a removal never shifts a later entry below the removed index.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AlternateIndexList<T> {
    list: Vec<IndexedValue<T>>,
}

impl<T> AlternateIndexList<T> {
    pub fn new() -> Self {
        AlternateIndexList { list: Vec::new() }
    }

    /// Indexes `values` consecutively from 0.
    pub fn with_values(values: impl IntoIterator<Item = T>) -> Self {
        AlternateIndexList {
            list: values
                .into_iter()
                .enumerate()
                .map(|(alternate_index, value)| IndexedValue {
                    alternate_index,
                    value,
                })
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    pub fn clear(&mut self) {
        self.list.clear();
    }

    fn lower_bound(&self, alternate_index: usize) -> usize {
        self.list
            .partition_point(|entry| entry.alternate_index < alternate_index)
    }

    fn find(&self, alternate_index: usize) -> Option<usize> {
        self.list
            .binary_search_by_key(&alternate_index, |entry| entry.alternate_index)
            .ok()
    }

    fn shift_up(&mut self, from: usize, by: usize) {
        for entry in &mut self.list[from..] {
            entry.alternate_index += by;
        }
    }

    /// Entries sharing a key with the removed one never move below `floor`.
    fn shift_down(&mut self, from: usize, by: usize, floor: usize) {
        for entry in &mut self.list[from..] {
            entry.alternate_index = entry.alternate_index.saturating_sub(by).max(floor);
        }
    }

    //<<<<>>>><<>><><<>><<<*>>><<>><><<>><<<<>>>>

    /// Inserts before any entry already at `alternate_index` and returns the
    /// physical position.
    pub fn insert(&mut self, alternate_index: usize, value: T) -> usize {
        let pos = self.lower_bound(alternate_index);
        self.shift_up(pos, 1);
        self.list.insert(
            pos,
            IndexedValue {
                alternate_index,
                value,
            },
        );
        pos
    }

    pub fn insert_range(&mut self, alternate_index: usize, values: impl IntoIterator<Item = T>) -> usize {
        let pos = self.lower_bound(alternate_index);
        let values: Vec<T> = values.into_iter().collect();
        self.shift_up(pos, values.len());
        self.list.splice(
            pos..pos,
            values
                .into_iter()
                .enumerate()
                .map(|(offset, value)| IndexedValue {
                    alternate_index: alternate_index + offset,
                    value,
                }),
        );
        pos
    }

    /// Removes the entry stored exactly at `alternate_index` and returns its
    /// former physical position.
    pub fn remove_at(&mut self, alternate_index: usize) -> Result<usize> {
        let pos = self
            .find(alternate_index)
            .ok_or(Error::AlternateIndexNotFound(alternate_index))?;
        self.list.remove(pos);
        self.shift_down(pos, 1, alternate_index);
        Ok(pos)
    }

    /// Removes up to `count` entries starting at the first entry whose
    /// alternate index is `>= alternate_index`. Returns how many were removed.
    pub fn remove_range(&mut self, alternate_index: usize, count: usize) -> usize {
        let pos = self.lower_bound(alternate_index);
        let end = pos.saturating_add(count).min(self.list.len());
        self.list.drain(pos..end);
        self.shift_down(pos, end - pos, alternate_index);
        end - pos
    }

    pub fn get(&self, alternate_index: usize) -> Option<&T> {
        self.find(alternate_index).map(|pos| &self.list[pos].value)
    }

    pub fn get_mut(&mut self, alternate_index: usize) -> Option<&mut T> {
        let pos = self.find(alternate_index)?;
        Some(&mut self.list[pos].value)
    }

    /// Overwrites in place without shifting. Returns `false` if no entry
    /// lives at `alternate_index`.
    pub fn set(&mut self, alternate_index: usize, value: T) -> bool {
        match self.get_mut(alternate_index) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    /// Moves one entry to a new alternate index without shifting the others.
    /// The entry is reinserted before any entry already at `new`.
    pub fn replace_alternate_index(&mut self, old: usize, new: usize) -> bool {
        let Some(pos) = self.find(old) else {
            return false;
        };
        let mut entry = self.list.remove(pos);
        entry.alternate_index = new;
        let to = self.lower_bound(new);
        self.list.insert(to, entry);
        true
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = (usize, &T)> + '_ {
        self.list
            .iter()
            .map(|entry| (entry.alternate_index, &entry.value))
    }

    pub fn values(&self) -> impl DoubleEndedIterator<Item = &T> + '_ {
        self.list.iter().map(|entry| &entry.value)
    }
}

impl<T: PartialEq> AlternateIndexList<T> {
    /// Removes the first entry equal to `value`, shifting later entries down.
    pub fn remove(&mut self, value: &T) -> bool {
        match self.list.iter().position(|entry| entry.value == *value) {
            Some(pos) => {
                let removed = self.list.remove(pos);
                self.shift_down(pos, 1, removed.alternate_index);
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, value: &T) -> bool {
        self.list.iter().any(|entry| entry.value == *value)
    }
}

impl<T: Clone> AlternateIndexList<T> {
    pub fn to_vec(&self) -> Vec<(usize, T)> {
        self.iter().map(|(i, v)| (i, v.clone())).collect()
    }
}

impl<T> Default for AlternateIndexList<T> {
    fn default() -> Self {
        AlternateIndexList::new()
    }
}

//<<<<>>>><<>><><<>><<<*>>><<>><><<>><<<<>>>>

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_shifts_later_entries() {
        let mut list = AlternateIndexList::new();
        list.insert(2, "foo");
        list.insert(8, "baz");
        list.insert(4, "bar");

        assert_eq!(list.to_vec(), vec![(2, "foo"), (4, "bar"), (9, "baz")]);
    }

    #[test]
    fn insert_at_existing_index_goes_before() {
        let mut list = AlternateIndexList::with_values(["a", "b"]);
        assert_eq!(list.insert(1, "x"), 1);

        assert_eq!(list.to_vec(), vec![(0, "a"), (1, "x"), (2, "b")]);
    }

    #[test]
    fn insert_range_shifts_by_span() {
        let mut list = AlternateIndexList::with_values([10, 20]);
        list.insert_range(1, [11, 12, 13]);

        assert_eq!(
            list.to_vec(),
            vec![(0, 10), (1, 11), (2, 12), (3, 13), (4, 20)]
        );
    }

    #[test]
    fn remove_at_requires_exact_index() {
        let mut list = AlternateIndexList::new();
        list.insert(3, 'a');
        list.insert(7, 'b');

        assert_eq!(list.remove_at(4), Err(Error::AlternateIndexNotFound(4)));
        assert_eq!(list.remove_at(3), Ok(0));
        assert_eq!(list.to_vec(), vec![(6, 'b')]);
    }

    #[test]
    fn remove_by_value_and_range() {
        let mut list = AlternateIndexList::with_values(0..6);

        assert!(list.remove(&2));
        assert!(!list.remove(&2));
        assert_eq!(list.remove_range(1, 2), 2);
        assert_eq!(list.to_vec(), vec![(0, 0), (1, 4), (2, 5)]);
    }

    #[test]
    fn get_and_set_do_not_shift() {
        let mut list = AlternateIndexList::new();
        list.insert(5, "five");

        assert_eq!(list.get(5), Some(&"five"));
        assert_eq!(list.get(4), None);
        assert!(list.set(5, "FIVE"));
        assert!(!list.set(6, "six"));
        assert_eq!(list.to_vec(), vec![(5, "FIVE")]);
    }

    #[test]
    fn replace_alternate_index_keeps_order() {
        let mut list = AlternateIndexList::with_values(['a', 'b', 'c']);

        assert!(list.replace_alternate_index(0, 10));
        assert!(!list.replace_alternate_index(0, 3));
        assert_eq!(list.to_vec(), vec![(1, 'b'), (2, 'c'), (10, 'a')]);
    }

    #[test]
    fn removal_after_shared_index_does_not_underflow() {
        let mut list = AlternateIndexList::with_values(['a', 'b']);

        assert!(list.replace_alternate_index(1, 0));
        assert_eq!(list.to_vec(), vec![(0, 'b'), (0, 'a')]);

        assert!(list.remove(&'b'));
        assert_eq!(list.to_vec(), vec![(0, 'a')]);

        assert_eq!(list.remove_at(0), Ok(0));
        assert!(list.is_empty());
    }

    #[test]
    fn shared_indices_stay_sorted_after_removal() {
        let mut list = AlternateIndexList::with_values(['a', 'b', 'c', 'd']);
        list.replace_alternate_index(3, 1);
        assert_eq!(list.to_vec(), vec![(0, 'a'), (1, 'd'), (1, 'b'), (2, 'c')]);

        assert!(list.remove(&'d'));
        assert_eq!(list.to_vec(), vec![(0, 'a'), (1, 'b'), (1, 'c')]);

        assert_eq!(list.remove_range(1, 1), 1);
        assert_eq!(list.to_vec(), vec![(0, 'a'), (1, 'c')]);
    }
}
