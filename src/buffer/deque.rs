use {
    crate::{
        buffer::ring::RingBuffer,
        error::Result,
        view::{
            change::{CollectionChange, Items},
            observer::{ChangeObserver, ObserverList, Subscription},
            source::ObservableCollection,
            sync_root::SyncRoot,
        },
    },
    parking_lot::{RwLock, RwLockWriteGuard},
    std::sync::Arc,
    tracing::trace,
};

//<<<<>>>><<>><><<>><<<*>>><<>><><<>><<<<>>>>

/// Double-ended observable queue backed by a [`RingBuffer`].
///
/// Pushes report `Add` at index 0 or `len`, pops report `Remove` at index 0
/// or `len - 1`. Like [`ObservableList`](crate::buffer::ObservableList),
/// subscribers run under the [`SyncRoot`] with the storage read-locked.
pub struct ObservableDeque<T> {
    root: SyncRoot,
    items: Arc<RwLock<RingBuffer<T>>>,
    observers: Arc<ObserverList<ChangeObserver<T>>>,
}

impl<T> Clone for ObservableDeque<T> {
    fn clone(&self) -> Self {
        ObservableDeque {
            root: self.root.clone(),
            items: self.items.clone(),
            observers: self.observers.clone(),
        }
    }
}

impl<T> ObservableDeque<T>
where
    T: Send + 'static,
{
    pub fn new() -> Self {
        ObservableDeque::with_capacity(0)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        ObservableDeque {
            root: SyncRoot::new(),
            items: Arc::new(RwLock::new(RingBuffer::with_capacity(capacity))),
            observers: Arc::new(ObserverList::new()),
        }
    }

    fn broadcast(&self, change: &CollectionChange<'_, T>) {
        trace!(kind = change.kind(), observers = self.observers.len(), "deque changed");
        self.observers.for_each(|observer| observer(change));
    }

    pub fn len(&self) -> usize {
        let _root = self.root.lock();
        self.items.read_recursive().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn push_back(&self, value: T) {
        let _root = self.root.lock();
        let mut items = self.items.write();

        items.push_back(value);
        let index = items.len() - 1;
        let items = RwLockWriteGuard::downgrade(items);
        self.broadcast(&CollectionChange::Add {
            items: Items::Single(&items[index]),
            index: Some(index),
        });
    }

    pub fn push_front(&self, value: T) {
        let _root = self.root.lock();
        let mut items = self.items.write();

        items.push_front(value);
        let items = RwLockWriteGuard::downgrade(items);
        self.broadcast(&CollectionChange::Add {
            items: Items::Single(&items[0]),
            index: Some(0),
        });
    }

    pub fn pop_front(&self) -> Result<T> {
        let _root = self.root.lock();
        let value = self.items.write().pop_front()?;
        self.broadcast(&CollectionChange::Remove {
            items: Items::Single(&value),
            index: Some(0),
        });
        Ok(value)
    }

    pub fn pop_back(&self) -> Result<T> {
        let _root = self.root.lock();
        let (value, index) = {
            let mut items = self.items.write();
            let value = items.pop_back()?;
            (value, items.len())
        };
        self.broadcast(&CollectionChange::Remove {
            items: Items::Single(&value),
            index: Some(index),
        });
        Ok(value)
    }

    pub fn clear(&self) {
        let _root = self.root.lock();
        self.items.write().clear();
        self.broadcast(&CollectionChange::Reset(None));
    }
}

impl<T> ObservableDeque<T>
where
    T: Clone + Send + 'static,
{
    pub fn get(&self, index: usize) -> Result<T> {
        let _root = self.root.lock();
        self.items.read_recursive().get(index).cloned()
    }

    pub fn front(&self) -> Result<T> {
        let _root = self.root.lock();
        self.items.read_recursive().front().cloned()
    }

    pub fn back(&self) -> Result<T> {
        let _root = self.root.lock();
        self.items.read_recursive().back().cloned()
    }

    pub fn to_vec(&self) -> Vec<T> {
        let _root = self.root.lock();
        self.items.read_recursive().to_vec()
    }
}

impl<T> Default for ObservableDeque<T>
where
    T: Send + 'static,
{
    fn default() -> Self {
        ObservableDeque::new()
    }
}

impl<T> ObservableCollection<T> for ObservableDeque<T>
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

impl<T> std::fmt::Debug for ObservableDeque<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObservableDeque")
            .field("root", &self.root)
            .finish_non_exhaustive()
    }
}

//<<<<>>>><<>><><<>><<<*>>><<>><><<>><<<<>>>>

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::{error::Error, projection::ViewExt, view::view_change::ViewChangeRecord},
        parking_lot::Mutex,
    };

    #[test]
    fn pops_report_their_end() {
        let deque = ObservableDeque::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        let l = log.clone();
        let _sub = deque.subscribe_with_snapshot(
            &mut |_: &i32| {},
            Box::new(move |change: &CollectionChange<'_, i32>| {
                if let CollectionChange::Remove { items, index } = change {
                    l.lock().push((*items.as_slice().first().unwrap_or(&-1), *index));
                }
            }),
        );

        deque.push_back(2);
        deque.push_front(1);
        deque.push_back(3);

        assert_eq!(deque.pop_back(), Ok(3));
        assert_eq!(deque.pop_front(), Ok(1));
        assert_eq!(*log.lock(), vec![(3, Some(2)), (1, Some(0))]);
    }

    #[test]
    fn empty_pops_fail_without_emitting() {
        let deque: ObservableDeque<u8> = ObservableDeque::new();

        assert_eq!(deque.pop_front(), Err(Error::Empty));
        assert_eq!(deque.pop_back(), Err(Error::Empty));
        assert_eq!(deque.front(), Err(Error::Empty));
    }

    #[test]
    fn snapshot_sees_current_order() {
        let deque = ObservableDeque::with_capacity(2);
        for i in 0..10 {
            deque.push_front(i);
        }

        let mut seen = Vec::new();
        let _sub = deque.subscribe_with_snapshot(&mut |x: &i32| seen.push(*x), Box::new(|_: &CollectionChange<'_, i32>| {}));

        assert_eq!(seen, (0..10).rev().collect::<Vec<_>>());
        assert_eq!(deque.get(9), Ok(0));
    }

    #[test]
    fn views_follow_both_ends() {
        let deque = ObservableDeque::new();
        for i in 1..=4 {
            deque.push_back(i);
        }
        let view = deque.create_view(|x| x * 10);
        view.attach_filter_fn(|x, _| x % 2 == 0);
        let log = Arc::new(Mutex::new(Vec::new()));
        let l = log.clone();
        let _sub = view.subscribe(move |change| l.lock().push(change.to_record()));

        deque.push_front(0);
        deque.push_front(-1);
        assert_eq!(deque.pop_back(), Ok(4));
        assert_eq!(deque.pop_front(), Ok(-1));
        deque.push_back(6);

        assert_eq!(
            *log.lock(),
            vec![
                ViewChangeRecord::Add { value: 0, view: 0, index: 0 },
                ViewChangeRecord::Remove { value: 4, view: 40, index: 2 },
                ViewChangeRecord::Add { value: 6, view: 60, index: 2 },
            ]
        );
        assert_eq!(view.snapshot().unwrap(), vec![(0, 0), (2, 20), (6, 60)]);
        assert_eq!(view.len(), 3);
    }
}
