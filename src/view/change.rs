use std::cmp::Ordering;

//<<<<>>>><<>><><<>><<<*>>><<>><><<>><<<<>>>>

/// The element(s) affected by an `Add` or `Remove`.
///
/// Both forms borrow from the source for the duration of the notification,
/// observers that want to keep an item must clone it.
#[derive(Debug)]
pub enum Items<'a, T> {
    Single(&'a T),
    Many(&'a [T]),
}

impl<'a, T> Items<'a, T> {
    pub fn as_slice(&self) -> &'a [T] {
        match *self {
            Items::Single(item) => std::slice::from_ref(item),
            Items::Many(items) => items,
        }
    }

    pub fn len(&self) -> usize {
        self.as_slice().len()
    }

    pub fn is_empty(&self) -> bool {
        self.as_slice().is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'a, T> {
        self.as_slice().iter()
    }
}

impl<'a, T> Clone for Items<'a, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<'a, T> Copy for Items<'a, T> {}

//<<<<>>>><<>><><<>><<<*>>><<>><><<>><<<<>>>>

/// How a range of the source was reordered.
pub enum SortOrder<'a, T> {
    Reverse,
    Compare(&'a dyn Fn(&T, &T) -> Ordering),
}

impl<'a, T> Clone for SortOrder<'a, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<'a, T> Copy for SortOrder<'a, T> {}

impl<'a, T> std::fmt::Debug for SortOrder<'a, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SortOrder::Reverse => f.write_str("Reverse"),
            SortOrder::Compare(_) => f.write_str("Compare(..)"),
        }
    }
}

/// A bulk reorder of `count` elements starting at `index`.
/// Membership is unchanged, only positions move.
#[derive(Debug)]
pub struct SortOperation<'a, T> {
    pub index: usize,
    pub count: usize,
    pub order: SortOrder<'a, T>,
}

impl<'a, T> SortOperation<'a, T> {
    pub fn reverse(index: usize, count: usize) -> Self {
        SortOperation {
            index,
            count,
            order: SortOrder::Reverse,
        }
    }

    pub fn compare(index: usize, count: usize, comparer: &'a dyn Fn(&T, &T) -> Ordering) -> Self {
        SortOperation {
            index,
            count,
            order: SortOrder::Compare(comparer),
        }
    }

    pub fn is_reverse(&self) -> bool {
        matches!(self.order, SortOrder::Reverse)
    }
}

impl<'a, T> Clone for SortOperation<'a, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<'a, T> Copy for SortOperation<'a, T> {}

//<<<<>>>><<>><><<>><<<*>>><<>><><<>><<<<>>>>

/// One mutation of a source collection.
///
/// Multi-item `Add`/`Remove` give the index of the first affected element.
/// An index of `None` means the source has no positional order (e.g. a set).
/// `Reset(None)` clears the collection, `Reset(Some(op))` reorders a range.
#[derive(Debug)]
pub enum CollectionChange<'a, T> {
    Add {
        items: Items<'a, T>,
        index: Option<usize>,
    },
    Remove {
        items: Items<'a, T>,
        index: Option<usize>,
    },
    Replace {
        new: &'a T,
        old: &'a T,
        index: usize,
    },
    Move {
        item: &'a T,
        old_index: usize,
        new_index: usize,
    },
    Reset(Option<SortOperation<'a, T>>),
}

impl<'a, T> CollectionChange<'a, T> {
    pub fn kind(&self) -> &'static str {
        match self {
            CollectionChange::Add { .. } => "add",
            CollectionChange::Remove { .. } => "remove",
            CollectionChange::Replace { .. } => "replace",
            CollectionChange::Move { .. } => "move",
            CollectionChange::Reset(None) => "clear",
            CollectionChange::Reset(Some(_)) => "reorder",
        }
    }
}

//<<<<>>>><<>><><<>><<<*>>><<>><><<>><<<<>>>>
