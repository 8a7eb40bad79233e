use {
    crate::view::change::{SortOperation, SortOrder},
    serde::{Deserialize, Serialize},
};

//<<<<>>>><<>><><<>><<<*>>><<>><><<>><<<<>>>>

/// Why a view was reset.
#[derive(Debug)]
pub enum ResetKind<'a, T> {
    /// The source was cleared.
    Clear,
    /// The source reordered a range; the view applied the same reorder.
    Sort(SortOperation<'a, T>),
    /// The filter was attached or reset, all visible entries changed.
    FilterChanged,
}

impl<'a, T> Clone for ResetKind<'a, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<'a, T> Copy for ResetKind<'a, T> {}

/// One change of a view, in *visible* coordinates.
///
/// Indices count only the entries that currently pass the view's filter.
#[derive(Debug)]
pub enum ViewChange<'a, T, V> {
    Add {
        value: &'a T,
        view: &'a V,
        index: usize,
    },
    Remove {
        value: &'a T,
        view: &'a V,
        index: usize,
    },
    Replace {
        new: (&'a T, &'a V),
        old: (&'a T, &'a V),
        index: usize,
    },
    Move {
        value: &'a T,
        view: &'a V,
        old_index: usize,
        new_index: usize,
    },
    Reset(ResetKind<'a, T>),
}

impl<'a, T, V> ViewChange<'a, T, V> {
    pub fn kind(&self) -> &'static str {
        match self {
            ViewChange::Add { .. } => "add",
            ViewChange::Remove { .. } => "remove",
            ViewChange::Replace { .. } => "replace",
            ViewChange::Move { .. } => "move",
            ViewChange::Reset(ResetKind::Clear) => "clear",
            ViewChange::Reset(ResetKind::Sort(_)) => "reorder",
            ViewChange::Reset(ResetKind::FilterChanged) => "filter",
        }
    }

    pub fn index(&self) -> Option<usize> {
        match *self {
            ViewChange::Add { index, .. }
            | ViewChange::Remove { index, .. }
            | ViewChange::Replace { index, .. } => Some(index),
            ViewChange::Move { new_index, .. } => Some(new_index),
            ViewChange::Reset(_) => None,
        }
    }
}

impl<'a, T: Clone, V: Clone> ViewChange<'a, T, V> {
    pub fn to_record(&self) -> ViewChangeRecord<T, V> {
        match *self {
            ViewChange::Add { value, view, index } => ViewChangeRecord::Add {
                value: value.clone(),
                view: view.clone(),
                index,
            },
            ViewChange::Remove { value, view, index } => ViewChangeRecord::Remove {
                value: value.clone(),
                view: view.clone(),
                index,
            },
            ViewChange::Replace { new, old, index } => ViewChangeRecord::Replace {
                new: (new.0.clone(), new.1.clone()),
                old: (old.0.clone(), old.1.clone()),
                index,
            },
            ViewChange::Move {
                value,
                view,
                old_index,
                new_index,
            } => ViewChangeRecord::Move {
                value: value.clone(),
                view: view.clone(),
                old_index,
                new_index,
            },
            ViewChange::Reset(kind) => ViewChangeRecord::Reset(match kind {
                ResetKind::Clear => ResetRecord::Clear,
                ResetKind::FilterChanged => ResetRecord::FilterChanged,
                ResetKind::Sort(op) => match op.order {
                    SortOrder::Reverse => ResetRecord::Reverse {
                        index: op.index,
                        count: op.count,
                    },
                    SortOrder::Compare(_) => ResetRecord::Sort {
                        index: op.index,
                        count: op.count,
                    },
                },
            }),
        }
    }
}

//<<<<>>>><<>><><<>><<<*>>><<>><><<>><<<<>>>>

/// Owned form of [`ResetKind`]. The comparer of a sort is not retained.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResetRecord {
    Clear,
    Reverse { index: usize, count: usize },
    Sort { index: usize, count: usize },
    FilterChanged,
}

/// Owned form of [`ViewChange`], suitable for queueing past the
/// notification and for persisting event logs.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum ViewChangeRecord<T, V> {
    Add { value: T, view: V, index: usize },
    Remove { value: T, view: V, index: usize },
    Replace { new: (T, V), old: (T, V), index: usize },
    Move { value: T, view: V, old_index: usize, new_index: usize },
    Reset(ResetRecord),
}

//<<<<>>>><<>><><<>><<<*>>><<>><><<>><<<<>>>>

/// A source mutation the view could not map onto itself.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Rejection {
    /// A positional reorder reached a view with its own ordering.
    Reorder { index: usize, count: usize },
    /// A removal without a source index reached a positional view.
    UnknownIndex { count: usize },
}

//<<<<>>>><<>><><<>><<<*>>><<>><><<>><<<<>>>>

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_keep_visible_indices() {
        let change = ViewChange::Move {
            value: &4,
            view: &"four".to_string(),
            old_index: 2,
            new_index: 0,
        };

        assert_eq!(change.index(), Some(0));
        assert_eq!(
            change.to_record(),
            ViewChangeRecord::Move {
                value: 4,
                view: "four".to_string(),
                old_index: 2,
                new_index: 0,
            }
        );
    }

    #[test]
    fn sort_reset_drops_comparer() {
        let cmp = |a: &i32, b: &i32| b.cmp(a);
        let change: ViewChange<'_, i32, i32> =
            ViewChange::Reset(ResetKind::Sort(SortOperation::compare(1, 4, &cmp)));

        assert_eq!(change.kind(), "reorder");
        assert_eq!(
            change.to_record(),
            ViewChangeRecord::Reset(ResetRecord::Sort { index: 1, count: 4 })
        );
    }

    #[test]
    fn records_serialize_as_json() {
        let record: ViewChangeRecord<i32, String> = ViewChangeRecord::Add {
            value: 3,
            view: "3".to_string(),
            index: 0,
        };

        let json = serde_json::to_string(&record).unwrap();
        assert_eq!(json, r#"{"Add":{"value":3,"view":"3","index":0}}"#);
        assert_eq!(
            serde_json::from_str::<ViewChangeRecord<i32, String>>(&json).unwrap(),
            record
        );
    }
}
