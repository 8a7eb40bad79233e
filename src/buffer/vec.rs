use {
    crate::{
        error::{Error, Result},
        view::{
            change::{CollectionChange, Items, SortOperation},
            observer::{ChangeObserver, ObserverList, Subscription},
            source::ObservableCollection,
            sync_root::SyncRoot,
        },
    },
    parking_lot::{RwLock, RwLockWriteGuard},
    std::{cmp::Ordering, sync::Arc},
    tracing::trace,
};

//<<<<>>>><<>><><<>><<<*>>><<>><><<>><<<<>>>>

fn check(len: usize, index: usize) -> Result<()> {
    if index < len {
        Ok(())
    } else {
        Err(Error::OutOfBounds { index, len })
    }
}

fn check_range(len: usize, index: usize, count: usize) -> Result<()> {
    match index.checked_add(count) {
        Some(end) if end <= len => Ok(()),
        _ => Err(Error::OutOfBounds {
            index: index.saturating_add(count),
            len,
        }),
    }
}

//<<<<>>>><<>><><<>><<<*>>><<>><><<>><<<<>>>>

/// A `Vec`-backed observable list.
///
/// Every mutation takes the list's [`SyncRoot`] and notifies subscribers
/// before releasing it. The storage itself is only read-locked while
/// subscribers run, so they may read the list. Clones share the same
/// storage.
pub struct ObservableList<T> {
    root: SyncRoot,
    items: Arc<RwLock<Vec<T>>>,
    observers: Arc<ObserverList<ChangeObserver<T>>>,
}

impl<T> Clone for ObservableList<T> {
    fn clone(&self) -> Self {
        ObservableList {
            root: self.root.clone(),
            items: self.items.clone(),
            observers: self.observers.clone(),
        }
    }
}

impl<T> ObservableList<T>
where
    T: Send + 'static,
{
    pub fn new() -> Self {
        ObservableList::with_data(Vec::new())
    }

    pub fn with_data(items: Vec<T>) -> Self {
        ObservableList {
            root: SyncRoot::new(),
            items: Arc::new(RwLock::new(items)),
            observers: Arc::new(ObserverList::new()),
        }
    }

    fn broadcast(&self, change: &CollectionChange<'_, T>) {
        trace!(kind = change.kind(), observers = self.observers.len(), "list changed");
        self.observers.for_each(|observer| observer(change));
    }

    pub fn len(&self) -> usize {
        let _root = self.root.lock();
        self.items.read_recursive().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn push(&self, value: T) {
        let _root = self.root.lock();
        let mut items = self.items.write();

        let index = items.len();
        items.push(value);
        let items = RwLockWriteGuard::downgrade(items);
        self.broadcast(&CollectionChange::Add {
            items: Items::Single(&items[index]),
            index: Some(index),
        });
    }

    /// Appends all values as one multi-item `Add`.
    pub fn extend(&self, values: impl IntoIterator<Item = T>) {
        let _root = self.root.lock();
        let mut items = self.items.write();

        let index = items.len();
        items.extend(values);
        let items = RwLockWriteGuard::downgrade(items);
        if items.len() > index {
            self.broadcast(&CollectionChange::Add {
                items: Items::Many(&items[index..]),
                index: Some(index),
            });
        }
    }

    pub fn insert(&self, index: usize, value: T) -> Result<()> {
        let _root = self.root.lock();
        let mut items = self.items.write();

        if index > items.len() {
            return Err(Error::OutOfBounds {
                index,
                len: items.len(),
            });
        }
        items.insert(index, value);
        let items = RwLockWriteGuard::downgrade(items);
        self.broadcast(&CollectionChange::Add {
            items: Items::Single(&items[index]),
            index: Some(index),
        });
        Ok(())
    }

    pub fn insert_range(&self, index: usize, values: impl IntoIterator<Item = T>) -> Result<()> {
        let _root = self.root.lock();
        let mut items = self.items.write();

        if index > items.len() {
            return Err(Error::OutOfBounds {
                index,
                len: items.len(),
            });
        }
        let before = items.len();
        items.splice(index..index, values);
        let count = items.len() - before;
        let items = RwLockWriteGuard::downgrade(items);
        if count > 0 {
            self.broadcast(&CollectionChange::Add {
                items: Items::Many(&items[index..index + count]),
                index: Some(index),
            });
        }
        Ok(())
    }

    pub fn remove_at(&self, index: usize) -> Result<T> {
        let _root = self.root.lock();
        let mut items = self.items.write();

        check(items.len(), index)?;
        let removed = items.remove(index);
        drop(items);
        self.broadcast(&CollectionChange::Remove {
            items: Items::Single(&removed),
            index: Some(index),
        });
        Ok(removed)
    }

    /// Removes `count` elements as one multi-item `Remove`.
    pub fn remove_range(&self, index: usize, count: usize) -> Result<Vec<T>> {
        let _root = self.root.lock();
        let mut items = self.items.write();

        check_range(items.len(), index, count)?;
        let removed: Vec<T> = items.drain(index..index + count).collect();
        drop(items);
        if !removed.is_empty() {
            self.broadcast(&CollectionChange::Remove {
                items: Items::Many(&removed),
                index: Some(index),
            });
        }
        Ok(removed)
    }

    /// Replaces the element at `index`, returning the old one.
    pub fn set(&self, index: usize, value: T) -> Result<T> {
        let _root = self.root.lock();
        let mut items = self.items.write();

        check(items.len(), index)?;
        let old = std::mem::replace(&mut items[index], value);
        let items = RwLockWriteGuard::downgrade(items);
        self.broadcast(&CollectionChange::Replace {
            new: &items[index],
            old: &old,
            index,
        });
        Ok(old)
    }

    pub fn move_item(&self, old_index: usize, new_index: usize) -> Result<()> {
        let _root = self.root.lock();
        let mut items = self.items.write();

        check(items.len(), old_index)?;
        check(items.len(), new_index)?;
        let item = items.remove(old_index);
        items.insert(new_index, item);
        let items = RwLockWriteGuard::downgrade(items);
        self.broadcast(&CollectionChange::Move {
            item: &items[new_index],
            old_index,
            new_index,
        });
        Ok(())
    }

    pub fn clear(&self) {
        let _root = self.root.lock();
        self.items.write().clear();
        self.broadcast(&CollectionChange::Reset(None));
    }

    pub fn reverse(&self) {
        let _root = self.root.lock();
        let len = self.items.read_recursive().len();
        let _ = self.reverse_range(0, len);
    }

    pub fn reverse_range(&self, index: usize, count: usize) -> Result<()> {
        let _root = self.root.lock();
        {
            let mut items = self.items.write();
            check_range(items.len(), index, count)?;
            items[index..index + count].reverse();
        }
        self.broadcast(&CollectionChange::Reset(Some(SortOperation::reverse(index, count))));
        Ok(())
    }

    /// Stable sort of the whole list.
    pub fn sort_by(&self, compare: impl Fn(&T, &T) -> Ordering) {
        let _root = self.root.lock();
        let len = self.items.read_recursive().len();
        let _ = self.sort_range_by(0, len, compare);
    }

    pub fn sort_range_by(
        &self,
        index: usize,
        count: usize,
        compare: impl Fn(&T, &T) -> Ordering,
    ) -> Result<()> {
        let _root = self.root.lock();
        {
            let mut items = self.items.write();
            check_range(items.len(), index, count)?;
            items[index..index + count].sort_by(&compare);
        }
        self.broadcast(&CollectionChange::Reset(Some(SortOperation::compare(index, count, &compare))));
        Ok(())
    }

    pub fn subscribe(&self, observer: impl FnMut(&CollectionChange<'_, T>) + Send + 'static) -> Subscription {
        self.subscribe_with_snapshot(&mut |_: &T| {}, Box::new(observer))
    }
}

impl<T> ObservableList<T>
where
    T: Clone + Send + 'static,
{
    pub fn get(&self, index: usize) -> Option<T> {
        let _root = self.root.lock();
        self.items.read_recursive().get(index).cloned()
    }

    pub fn to_vec(&self) -> Vec<T> {
        let _root = self.root.lock();
        self.items.read_recursive().clone()
    }
}

impl<T> ObservableList<T>
where
    T: PartialEq + Send + 'static,
{
    /// Removes the first element equal to `value`. Returns `false` and
    /// emits nothing if there is none.
    pub fn remove(&self, value: &T) -> bool {
        let _root = self.root.lock();
        let index = self.items.read_recursive().iter().position(|item| item == value);
        match index {
            Some(index) => self.remove_at(index).is_ok(),
            None => false,
        }
    }

    pub fn contains(&self, value: &T) -> bool {
        let _root = self.root.lock();
        self.items.read_recursive().contains(value)
    }
}

impl<T> Default for ObservableList<T>
where
    T: Send + 'static,
{
    fn default() -> Self {
        ObservableList::new()
    }
}

impl<T> ObservableCollection<T> for ObservableList<T>
where
    T: Send + 'static,
{
    fn sync_root(&self) -> SyncRoot {
        self.root.clone()
    }

    fn subscribe_with_snapshot(
        &self,
        snapshot: &mut dyn FnMut(&T),
        observer: Box<ChangeObserver<T>>,
    ) -> Subscription {
        let _root = self.root.lock();
        for item in self.items.read_recursive().iter() {
            snapshot(item);
        }
        let id = self.observers.add(observer);

        let weak = Arc::downgrade(&self.observers);
        Subscription::new(id, move |id| {
            if let Some(observers) = weak.upgrade() {
                observers.remove(id);
            }
        })
    }
}

//<<<<>>>><<>><><<>><<<*>>><<>><><<>><<<<>>>>
