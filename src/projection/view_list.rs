use {
    crate::view::view_change::{ResetKind, ViewChange},
    tracing::trace,
};

//<<<<>>>><<>><><<>><<<*>>><<>><><<>><<<<>>>>

/// Flat list of the visible views of a view, maintained from its events.
///
/// Every event except a reorder or filter reset applies in place. For those
/// [`ViewList::apply`] returns `false` and the owner is expected to
/// [`resync`](ViewList::resync) from a fresh snapshot.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ViewList<V> {
    items: Vec<V>,
}

impl<V: Clone> ViewList<V> {
    pub fn new() -> Self {
        ViewList { items: Vec::new() }
    }

    pub fn from_views(views: impl IntoIterator<Item = V>) -> Self {
        ViewList {
            items: views.into_iter().collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn as_slice(&self) -> &[V] {
        &self.items
    }

    pub fn get(&self, index: usize) -> Option<&V> {
        self.items.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, V> {
        self.items.iter()
    }

    pub fn resync(&mut self, views: impl IntoIterator<Item = V>) {
        self.items.clear();
        self.items.extend(views);
        trace!(len = self.items.len(), "view list resynced");
    }

    /// Applies one event. Returns `false` if the list cannot follow it and
    /// needs a resync, or if an index does not fit.
    pub fn apply<T>(&mut self, change: &ViewChange<'_, T, V>) -> bool {
        match *change {
            ViewChange::Add { view, index, .. } if index <= self.items.len() => {
                self.items.insert(index, view.clone());
                true
            }
            ViewChange::Remove { index, .. } if index < self.items.len() => {
                self.items.remove(index);
                true
            }
            ViewChange::Replace { new, index, .. } if index < self.items.len() => {
                self.items[index] = new.1.clone();
                true
            }
            ViewChange::Move {
                old_index,
                new_index,
                ..
            } if old_index < self.items.len() && new_index < self.items.len() => {
                let view = self.items.remove(old_index);
                self.items.insert(new_index, view);
                true
            }
            ViewChange::Reset(ResetKind::Clear) => {
                self.items.clear();
                true
            }
            _ => false,
        }
    }
}

impl<'a, V> IntoIterator for &'a ViewList<V> {
    type Item = &'a V;
    type IntoIter = std::slice::Iter<'a, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

//<<<<>>>><<>><><<>><<<*>>><<>><><<>><<<<>>>>

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::{buffer::vec::ObservableList, projection::ViewExt},
        parking_lot::Mutex,
        std::sync::Arc,
    };

    #[test]
    fn follows_a_filtered_view() {
        let source = ObservableList::with_data(vec![1, 2, 3, 4, 5, 6]);
        let view = source.create_view(|x| x * 100);
        view.attach_filter_fn(|x, _| x % 2 == 0);

        let list = Arc::new(Mutex::new(ViewList::from_views(
            view.snapshot().unwrap().into_iter().map(|(_, v)| v),
        )));
        let l = list.clone();
        let _sub = view.subscribe(move |change| {
            assert!(l.lock().apply(change));
        });

        source.push(8);
        source.remove_at(1).unwrap();
        source.set(0, 10).unwrap();
        source.set(2, 7).unwrap();
        source.move_item(0, 3).unwrap();
        source.insert(2, 12).unwrap();

        let expected: Vec<i32> = view.snapshot().unwrap().into_iter().map(|(_, v)| v).collect();
        assert_eq!(list.lock().as_slice(), expected.as_slice());
        assert_eq!(expected, vec![1200, 1000, 600, 800]);
    }

    #[test]
    fn reorders_ask_for_resync() {
        let source = ObservableList::with_data(vec![3, 1, 2]);
        let view = source.create_view(|x| *x);
        let mut list = ViewList::from_views(source.to_vec());

        let outcome = Arc::new(Mutex::new(Vec::new()));
        let o = outcome.clone();
        let _sub = view.subscribe(move |change| o.lock().push(ViewList::<i32>::new().apply(change)));

        source.sort_by(|a, b| a.cmp(b));
        source.clear();

        assert_eq!(*outcome.lock(), vec![false, true]);
        list.resync(view.snapshot().unwrap().into_iter().map(|(_, v)| v));
        assert!(list.is_empty());
    }
}
