use {
    crate::{
        buffer::ranked::{NodeId, RankedTree},
        error::{Error, Result},
        projection::{
            filter::{FilterState, FnFilter, ViewFilter},
            observe, ViewCell,
        },
        view::{
            change::CollectionChange,
            channel::EventSink,
            observer::{CountObserver, RejectionObserver, Subscription, ViewBroadcast, ViewObserver},
            source::ObservableCollection,
            sync_root::SyncRoot,
            view_change::{Rejection, ResetKind, ViewChange, ViewChangeRecord},
        },
    },
    parking_lot::{Mutex, MutexGuard, ReentrantMutexGuard},
    std::{cmp::Ordering, collections::HashMap, hash::Hash, sync::Arc},
    tracing::{debug, trace},
};

//<<<<>>>><<>><><<>><<<*>>><<>><><<>><<<<>>>>

/// What a [`SortedView`] compares before falling back to the identity key.
pub enum SortKey<T, V> {
    ByValue(Box<dyn Fn(&T, &T) -> Ordering + Send>),
    ByView(Box<dyn Fn(&V, &V) -> Ordering + Send>),
}

struct SortedEntry<K, T, V> {
    key: K,
    value: T,
    view: V,
}

fn compare_entries<K: Ord, T, V>(
    order: &SortKey<T, V>,
    a: &SortedEntry<K, T, V>,
    b: &SortedEntry<K, T, V>,
) -> Ordering {
    let ordering = match order {
        SortKey::ByValue(compare) => compare(&a.value, &b.value),
        SortKey::ByView(compare) => compare(&a.view, &b.view),
    };
    ordering.then_with(|| a.key.cmp(&b.key))
}

fn entry_at<E>(tree: &RankedTree<E>, rank: usize) -> &E {
    match tree.get(rank) {
        Some(entry) => entry,
        None => panic!("rank {rank} out of range for sorted view of {}", tree.len()),
    }
}

struct SortedState<T, V, K> {
    tree: RankedTree<SortedEntry<K, T, V>>,
    nodes: HashMap<K, NodeId>,
    identity: Box<dyn Fn(&T) -> K + Send>,
    transform: Box<dyn Fn(&T) -> V + Send>,
    order: SortKey<T, V>,
    filter: FilterState<T, V>,
    cast: ViewBroadcast<T, V>,
    disposed: bool,
}

impl<T, V, K> SortedState<T, V, K>
where
    T: Clone,
    K: Ord + Hash + Clone,
{
    /// Position among the visible entries. Tree marks track the filter.
    fn visible_rank(&self, rank: usize) -> usize {
        self.tree.marked_before(rank)
    }

    fn remark(&mut self) {
        let filter = &self.filter;
        self.tree.remark(|e| filter.is_match(&e.value, &e.view));
    }

    /// Current rank of the entry stored under `key`.
    fn locate(&self, key: &K) -> usize {
        let Some(&node) = self.nodes.get(key) else {
            panic!("sorted view has no entry for a key its source reported");
        };
        let order = &self.order;
        match self.tree.rank_of(node, |a, b| compare_entries(order, a, b)) {
            Some(rank) => rank,
            None => panic!("sorted view lost track of an entry"),
        }
    }

    /// Inserts at the sorted position, counting the entry against the filter.
    /// Returns the rank and whether the entry is visible, or `None` if the
    /// identity key is already present.
    fn insert(&mut self, value: &T) -> Option<(usize, bool)> {
        let key = (self.identity)(value);
        if self.nodes.contains_key(&key) {
            return None;
        }
        let entry = SortedEntry {
            key: key.clone(),
            value: value.clone(),
            view: (self.transform)(value),
        };

        let order = &self.order;
        let rank = match self.tree.search_by(|other| compare_entries(order, other, &entry)) {
            Ok(rank) | Err(rank) => rank,
        };
        let visible = self.filter.added(&entry.value, &entry.view);
        let node = self.tree.insert_marked(rank, entry, visible);
        self.nodes.insert(key, node);
        Some((rank, visible))
    }

    fn add(&mut self, value: &T) {
        let Some((rank, visible)) = self.insert(value) else {
            panic!("duplicate identity key in sorted view");
        };

        if visible {
            let index = self.visible_rank(rank);
            let entry = entry_at(&self.tree, rank);
            self.cast.notify(&ViewChange::Add {
                value: &entry.value,
                view: &entry.view,
                index,
            });
        }
    }

    fn remove(&mut self, value: &T) {
        let key = (self.identity)(value);
        let rank = self.locate(&key);
        let index = self.visible_rank(rank);

        self.nodes.remove(&key);
        let Some(entry) = self.tree.remove_at(rank) else {
            panic!("rank {rank} vanished from sorted view");
        };
        if self.filter.removed(&entry.value, &entry.view) {
            self.cast.notify(&ViewChange::Remove {
                value: &entry.value,
                view: &entry.view,
                index,
            });
        }
    }

    fn replay(&mut self, change: &CollectionChange<'_, T>) {
        if self.disposed {
            return;
        }
        trace!(kind = change.kind(), "replaying source change into sorted view");
        let before = self.filter.visible_count();

        match *change {
            CollectionChange::Add { items, .. } => {
                for value in items.iter() {
                    self.add(value);
                }
            }
            CollectionChange::Remove { items, .. } => {
                for value in items.iter() {
                    self.remove(value);
                }
            }
            CollectionChange::Replace { new, old, .. } => {
                self.remove(old);
                self.add(new);
            }
            CollectionChange::Move { item, .. } => {
                let rank = self.locate(&(self.identity)(item));
                if self.tree.is_marked(rank) {
                    let index = self.visible_rank(rank);
                    let entry = entry_at(&self.tree, rank);
                    self.cast.notify(&ViewChange::Move {
                        value: &entry.value,
                        view: &entry.view,
                        old_index: index,
                        new_index: index,
                    });
                }
            }
            CollectionChange::Reset(None) => {
                self.tree.clear();
                self.nodes.clear();
                self.filter.cleared();
                self.cast.notify(&ViewChange::Reset(ResetKind::Clear));
            }
            CollectionChange::Reset(Some(op)) => {
                self.cast.reject(Rejection::Reorder {
                    index: op.index,
                    count: op.count,
                });
            }
        }

        let after = self.filter.visible_count();
        if after != before {
            self.cast.count_changed(after);
        }
    }

    fn filter_changed(&mut self, before: usize) {
        self.cast.notify(&ViewChange::Reset(ResetKind::FilterChanged));
        let after = self.filter.visible_count();
        if after != before {
            self.cast.count_changed(after);
        }
    }
}

impl<T, V, K> ViewCell<T, V> for SortedState<T, V, K>
where
    T: Send + 'static,
    V: Send + 'static,
    K: Send + 'static,
{
    fn broadcast(&self) -> Option<&ViewBroadcast<T, V>> {
        if self.disposed {
            None
        } else {
            Some(&self.cast)
        }
    }
}

//<<<<>>>><<>><><<>><<<*>>><<>><><<>><<<<>>>>

/// A transformed view kept in its own order, independent of source
/// positions.
///
/// Entries are ordered by the [`SortKey`] and then by an identity key, which
/// must be unique per source element. Events report ranks among the visible
/// entries. A `Replace` is always reported as `Remove` followed by `Add`,
/// a `Move` only when the entry is visible and at its unchanged rank.
/// Positional reorders of the source are rejected.
pub struct SortedView<T, V, K> {
    root: SyncRoot,
    state: Arc<Mutex<SortedState<T, V, K>>>,
    subscription: Mutex<Option<Subscription>>,
}

impl<T, V, K> SortedView<T, V, K>
where
    T: Clone + Send + 'static,
    V: Send + 'static,
    K: Ord + Hash + Clone + Send + 'static,
{
    /// Fails with [`Error::DuplicateKey`] if two current source elements
    /// share an identity key.
    pub fn new<S>(
        source: &S,
        identity: impl Fn(&T) -> K + Send + 'static,
        transform: impl Fn(&T) -> V + Send + 'static,
        order: SortKey<T, V>,
    ) -> Result<Self>
    where
        S: ObservableCollection<T> + ?Sized,
    {
        let root = source.sync_root();
        let _root = root.lock();

        let state = Arc::new(Mutex::new(SortedState {
            tree: RankedTree::new(),
            nodes: HashMap::new(),
            identity: Box::new(identity),
            transform: Box::new(transform),
            order,
            filter: FilterState::new(),
            cast: ViewBroadcast::new(),
            disposed: false,
        }));

        let mut duplicate = false;
        let weak = Arc::downgrade(&state);
        let subscription = source.subscribe_with_snapshot(
            &mut |value: &T| {
                if state.lock().insert(value).is_none() {
                    duplicate = true;
                }
            },
            Box::new(move |change: &CollectionChange<'_, T>| {
                if let Some(state) = weak.upgrade() {
                    state.lock().replay(change);
                }
            }),
        );
        if duplicate {
            drop(subscription);
            return Err(Error::DuplicateKey);
        }

        debug!(len = state.lock().tree.len(), "created sorted view");
        drop(_root);

        Ok(SortedView {
            root,
            state,
            subscription: Mutex::new(Some(subscription)),
        })
    }

    pub fn sync_root(&self) -> SyncRoot {
        self.root.clone()
    }

    /// Number of entries passing the filter.
    pub fn len(&self) -> usize {
        let _root = self.root.lock();
        self.state.lock().filter.visible_count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn unfiltered_len(&self) -> usize {
        let _root = self.root.lock();
        self.state.lock().tree.len()
    }

    pub fn is_disposed(&self) -> bool {
        let _root = self.root.lock();
        self.state.lock().disposed
    }

    pub fn is_filtered(&self) -> bool {
        let _root = self.root.lock();
        self.state.lock().filter.is_installed()
    }

    pub fn subscribe(&self, observer: impl FnMut(&ViewChange<'_, T, V>) + Send + 'static) -> Subscription {
        let _root = self.root.lock();
        let observer: Box<ViewObserver<T, V>> = Box::new(observer);
        observe::<_, T, V, _>(&self.state, observer, |cast| &cast.changes)
    }

    pub fn subscribe_count(&self, observer: impl FnMut(usize) + Send + 'static) -> Subscription {
        let _root = self.root.lock();
        let observer: Box<CountObserver> = Box::new(observer);
        observe::<_, T, V, _>(&self.state, observer, |cast| &cast.counts)
    }

    pub fn subscribe_rejections(&self, observer: impl FnMut(&Rejection) + Send + 'static) -> Subscription {
        let _root = self.root.lock();
        let observer: Box<RejectionObserver> = Box::new(observer);
        observe::<_, T, V, _>(&self.state, observer, |cast| &cast.rejections)
    }

    pub fn attach_filter(&self, filter: impl ViewFilter<T, V> + 'static) {
        let _root = self.root.lock();
        let mut guard = self.state.lock();
        let state = &mut *guard;
        if state.disposed {
            return;
        }

        let before = state.filter.visible_count();
        state.filter.attach(
            Box::new(filter),
            state.tree.iter().map(|e| (&e.value, &e.view)),
        );
        state.remark();
        state.filter_changed(before);
    }

    pub fn attach_filter_fn(&self, predicate: impl Fn(&T, &V) -> bool + Send + 'static) {
        self.attach_filter(FnFilter(predicate));
    }

    pub fn reset_filter(&self) {
        self.reset_filter_with(|_, _| {});
    }

    pub fn reset_filter_with(&self, on_reset: impl FnMut(&T, &V)) {
        let _root = self.root.lock();
        let mut guard = self.state.lock();
        let state = &mut *guard;
        if state.disposed {
            return;
        }

        let before = state.filter.visible_count();
        state
            .filter
            .reset(state.tree.iter().map(|e| (&e.value, &e.view)), on_reset);
        state.remark();
        state.filter_changed(before);
    }

    pub fn lock(&self) -> Result<SortedGuard<'_, T, V, K>> {
        let root = self.root.lock();
        let state = self.state.lock();
        if state.disposed {
            return Err(Error::Disposed);
        }
        Ok(SortedGuard { state, _root: root })
    }
}

impl<T, V, K> SortedView<T, V, K> {
    pub fn dispose(&self) {
        let _root = self.root.lock();
        let subscription = self.subscription.lock().take();
        let Some(mut subscription) = subscription else {
            return;
        };
        subscription.cancel();

        let mut state = self.state.lock();
        state.disposed = true;
        state.tree.clear();
        state.nodes.clear();
        state.filter.cleared();
        state.cast.clear();
        debug!("disposed sorted view");
    }
}

impl<T, V, K> SortedView<T, V, K>
where
    T: Clone + Send + 'static,
    V: Clone + Send + 'static,
    K: Ord + Hash + Clone + Send + 'static,
{
    pub fn snapshot(&self) -> Result<Vec<(T, V)>> {
        let guard = self.lock()?;
        let entries = guard.iter().map(|(t, v)| (t.clone(), v.clone())).collect();
        Ok(entries)
    }

    pub fn dispatch_to(&self, sink: impl EventSink<ViewChangeRecord<T, V>> + 'static) -> Subscription {
        self.subscribe(move |change| sink.post(change.to_record()))
    }
}

impl<T, V, K> Drop for SortedView<T, V, K> {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl<T, V, K> std::fmt::Debug for SortedView<T, V, K> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SortedView")
            .field("root", &self.root)
            .finish_non_exhaustive()
    }
}

//<<<<>>>><<>><><<>><<<*>>><<>><><<>><<<<>>>>

pub struct SortedGuard<'a, T, V, K> {
    state: MutexGuard<'a, SortedState<T, V, K>>,
    _root: ReentrantMutexGuard<'a, ()>,
}

impl<'a, T, V, K> SortedGuard<'a, T, V, K> {
    pub fn len(&self) -> usize {
        self.state.filter.visible_count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Visible entries in sort order.
    pub fn iter(&self) -> impl Iterator<Item = (&T, &V)> + '_ {
        let filter = &self.state.filter;
        self.state
            .tree
            .iter()
            .map(|e| (&e.value, &e.view))
            .filter(move |(t, v)| filter.is_match(t, v))
    }
}

//<<<<>>>><<>><><<>><<<*>>><<>><><<>><<<<>>>>
