use {
    crate::{
        buffer::ring::RingBuffer,
        error::{Error, Result},
        projection::{
            filter::{FilterState, FnFilter, Transition, ViewFilter},
            observe, ViewCell, ViewOptions,
        },
        view::{
            change::{CollectionChange, SortOrder},
            channel::EventSink,
            observer::{CountObserver, RejectionObserver, Subscription, ViewBroadcast, ViewObserver},
            source::ObservableCollection,
            sync_root::SyncRoot,
            view_change::{Rejection, ResetKind, ViewChange, ViewChangeRecord},
        },
    },
    parking_lot::{Mutex, MutexGuard, ReentrantMutexGuard},
    std::sync::{Arc, Weak},
    tracing::{debug, trace},
};

//<<<<>>>><<>><><<>><<<*>>><<>><><<>><<<<>>>>

struct ViewState<T, V> {
    mirror: RingBuffer<(T, V)>,
    transform: Box<dyn Fn(&T) -> V + Send>,
    filter: FilterState<T, V>,
    cast: ViewBroadcast<T, V>,
    options: ViewOptions,
    disposed: bool,
}

fn out_of_sync(err: Error) -> ! {
    panic!("view out of sync with its source: {err}")
}

impl<T, V> ViewState<T, V>
where
    T: Clone,
{
    fn visible_index(&self, position: usize) -> usize {
        self.filter
            .visible_before(self.mirror.iter().map(|(t, v)| (t, v)), position)
    }

    fn replay(&mut self, change: &CollectionChange<'_, T>) {
        if self.disposed {
            return;
        }
        trace!(kind = change.kind(), "replaying source change");
        let before = self.filter.visible_count();

        match *change {
            CollectionChange::Add { items, index } => {
                let start = index.unwrap_or(self.mirror.len());
                for (offset, value) in items.iter().enumerate() {
                    let position = start + offset;
                    let view = (self.transform)(value);
                    self.mirror
                        .insert(position, (value.clone(), view))
                        .unwrap_or_else(|err| out_of_sync(err));

                    let (value, view) = &self.mirror[position];
                    if self.filter.added(value, view) {
                        let index = self.visible_index(position);
                        let (value, view) = &self.mirror[position];
                        self.cast.notify(&ViewChange::Add { value, view, index });
                    }
                }
            }

            CollectionChange::Remove { items, index: None } => {
                self.cast.reject(Rejection::UnknownIndex { count: items.len() });
            }

            CollectionChange::Remove {
                items,
                index: Some(start),
            } => {
                for _ in 0..items.len() {
                    let index = self.visible_index(start);
                    let (value, view) = self.mirror.remove_at(start).unwrap_or_else(|err| out_of_sync(err));
                    if self.filter.removed(&value, &view) {
                        self.cast.notify(&ViewChange::Remove {
                            value: &value,
                            view: &view,
                            index,
                        });
                    }
                }
            }

            CollectionChange::Replace { new, index, .. } => {
                let view = (self.transform)(new);
                let old = self
                    .mirror
                    .set(index, (new.clone(), view))
                    .unwrap_or_else(|err| out_of_sync(err));
                let visible = self.visible_index(index);

                let new = &self.mirror[index];
                match self.filter.replaced((&old.0, &old.1), (&new.0, &new.1)) {
                    Transition::Replace => self.cast.notify(&ViewChange::Replace {
                        new: (&new.0, &new.1),
                        old: (&old.0, &old.1),
                        index: visible,
                    }),
                    Transition::Remove => self.cast.notify(&ViewChange::Remove {
                        value: &old.0,
                        view: &old.1,
                        index: visible,
                    }),
                    Transition::Add => self.cast.notify(&ViewChange::Add {
                        value: &new.0,
                        view: &new.1,
                        index: visible,
                    }),
                    Transition::Nothing => {}
                }
            }

            CollectionChange::Move {
                old_index,
                new_index,
                ..
            } => {
                let old_visible = self.visible_index(old_index);
                let entry = self.mirror.remove_at(old_index).unwrap_or_else(|err| out_of_sync(err));
                self.mirror
                    .insert(new_index, entry)
                    .unwrap_or_else(|err| out_of_sync(err));

                let (value, view) = &self.mirror[new_index];
                if self.filter.is_match(value, view) {
                    let new_visible = self.visible_index(new_index);
                    let (value, view) = &self.mirror[new_index];
                    self.cast.notify(&ViewChange::Move {
                        value,
                        view,
                        old_index: old_visible,
                        new_index: new_visible,
                    });
                }
            }

            CollectionChange::Reset(None) => {
                self.mirror.clear();
                self.filter.cleared();
                self.cast.notify(&ViewChange::Reset(ResetKind::Clear));
            }

            CollectionChange::Reset(Some(op)) => {
                let reordered = match op.order {
                    SortOrder::Reverse => self.mirror.reverse_range(op.index, op.count),
                    SortOrder::Compare(compare) => {
                        self.mirror
                            .sort_range_by(op.index, op.count, |a, b| compare(&a.0, &b.0))
                    }
                };
                reordered.unwrap_or_else(|err| out_of_sync(err));
                self.cast.notify(&ViewChange::Reset(ResetKind::Sort(op)));
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

impl<T, V> ViewCell<T, V> for ViewState<T, V>
where
    T: Send + 'static,
    V: Send + 'static,
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

/// A transformed, optionally filtered mirror of a positional source.
///
/// Every source mutation is replayed inside the source's critical section,
/// so the view is never observed stale. Events carry *visible* indices.
pub struct SynchronizedView<T, V> {
    root: SyncRoot,
    state: Arc<Mutex<ViewState<T, V>>>,
    subscription: Mutex<Option<Subscription>>,
}

impl<T, V> SynchronizedView<T, V>
where
    T: Clone + Send + 'static,
    V: Send + 'static,
{
    pub fn new<S>(source: &S, transform: impl Fn(&T) -> V + Send + 'static, options: ViewOptions) -> Self
    where
        S: ObservableCollection<T> + ?Sized,
    {
        let root = source.sync_root();
        let _root = root.lock();

        let state = Arc::new(Mutex::new(ViewState {
            mirror: RingBuffer::new(),
            transform: Box::new(transform),
            filter: FilterState::new(),
            cast: ViewBroadcast::new(),
            options,
            disposed: false,
        }));

        let weak: Weak<Mutex<ViewState<T, V>>> = Arc::downgrade(&state);
        let subscription = source.subscribe_with_snapshot(
            &mut |value: &T| {
                let mut guard = state.lock();
                let state = &mut *guard;
                let view = (state.transform)(value);
                state.filter.added(value, &view);
                state.mirror.push_back((value.clone(), view));
            },
            Box::new(move |change: &CollectionChange<'_, T>| {
                if let Some(state) = weak.upgrade() {
                    state.lock().replay(change);
                }
            }),
        );

        debug!(len = state.lock().mirror.len(), reverse = options.reverse, "created synchronized view");
        drop(_root);

        SynchronizedView {
            root,
            state,
            subscription: Mutex::new(Some(subscription)),
        }
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
        self.state.lock().mirror.len()
    }

    pub fn is_disposed(&self) -> bool {
        let _root = self.root.lock();
        self.state.lock().disposed
    }

    pub fn is_filtered(&self) -> bool {
        let _root = self.root.lock();
        self.state.lock().filter.is_installed()
    }

    //<<<<>>>><<>><><<>><<<*>>><<>><><<>><<<<>>>>

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

    //<<<<>>>><<>><><<>><<<*>>><<>><><<>><<<<>>>>

    /// Installs `filter`, recounts the mirror once and reports
    /// `Reset(FilterChanged)`.
    pub fn attach_filter(&self, filter: impl ViewFilter<T, V> + 'static) {
        let _root = self.root.lock();
        let mut guard = self.state.lock();
        let state = &mut *guard;
        if state.disposed {
            return;
        }

        let before = state.filter.visible_count();
        state
            .filter
            .attach(Box::new(filter), state.mirror.iter().map(|(t, v)| (t, v)));
        state.filter_changed(before);
    }

    pub fn attach_filter_fn(&self, predicate: impl Fn(&T, &V) -> bool + Send + 'static) {
        self.attach_filter(FnFilter(predicate));
    }

    pub fn reset_filter(&self) {
        self.reset_filter_with(|_, _| {});
    }

    /// Removes the filter and hands every entry to `on_reset`.
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
            .reset(state.mirror.iter().map(|(t, v)| (t, v)), on_reset);
        state.filter_changed(before);
    }

    //<<<<>>>><<>><><<>><<<*>>><<>><><<>><<<<>>>>

    /// Holds the source's critical section for as long as the guard lives.
    pub fn lock(&self) -> Result<ViewGuard<'_, T, V>> {
        let root = self.root.lock();
        let state = self.state.lock();
        if state.disposed {
            return Err(Error::Disposed);
        }
        Ok(ViewGuard { state, _root: root })
    }
}

impl<T, V> SynchronizedView<T, V> {
    /// Stops observing the source and drops the mirror. Idempotent.
    pub fn dispose(&self) {
        let _root = self.root.lock();
        let subscription = self.subscription.lock().take();
        let Some(mut subscription) = subscription else {
            return;
        };
        subscription.cancel();

        let mut state = self.state.lock();
        state.disposed = true;
        state.mirror.clear();
        state.filter.cleared();
        state.cast.clear();
        debug!("disposed synchronized view");
    }
}

impl<T, V> SynchronizedView<T, V>
where
    T: Clone + Send + 'static,
    V: Clone + Send + 'static,
{
    /// Copies the visible entries, releasing the lock before returning.
    pub fn snapshot(&self) -> Result<Vec<(T, V)>> {
        let guard = self.lock()?;
        let entries = guard.iter().map(|(t, v)| (t.clone(), v.clone())).collect();
        Ok(entries)
    }

    /// Forwards every event of this view to `sink` as an owned record.
    pub fn dispatch_to(&self, sink: impl EventSink<ViewChangeRecord<T, V>> + 'static) -> Subscription {
        self.subscribe(move |change| sink.post(change.to_record()))
    }
}

impl<T, V> Drop for SynchronizedView<T, V> {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl<T, V> std::fmt::Debug for SynchronizedView<T, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SynchronizedView")
            .field("root", &self.root)
            .finish_non_exhaustive()
    }
}

//<<<<>>>><<>><><<>><<<*>>><<>><><<>><<<<>>>>

/// Read access to a [`SynchronizedView`] under its source's lock.
pub struct ViewGuard<'a, T, V> {
    state: MutexGuard<'a, ViewState<T, V>>,
    _root: ReentrantMutexGuard<'a, ()>,
}

impl<'a, T, V> ViewGuard<'a, T, V> {
    pub fn len(&self) -> usize {
        self.state.filter.visible_count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Visible entries, in reverse when the view was created reversed.
    pub fn iter(&self) -> Box<dyn Iterator<Item = (&T, &V)> + '_> {
        let filter = &self.state.filter;
        let visible = self
            .state
            .mirror
            .iter()
            .map(|(t, v)| (t, v))
            .filter(move |(t, v)| filter.is_match(t, v));
        if self.state.options.reverse {
            Box::new(visible.rev())
        } else {
            Box::new(visible)
        }
    }
}

//<<<<>>>><<>><><<>><<<*>>><<>><><<>><<<<>>>>

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::{
            buffer::vec::ObservableList,
            projection::ViewExt,
            view::{change::Items, view_change::ResetRecord},
        },
    };

    fn record<V: Clone + Send + 'static>(
        view: &SynchronizedView<i32, V>,
    ) -> (Subscription, Arc<Mutex<Vec<ViewChangeRecord<i32, V>>>>) {
        let log = Arc::new(Mutex::new(Vec::new()));
        let l = log.clone();
        let sub = view.subscribe(move |change| l.lock().push(change.to_record()));
        (sub, log)
    }

    fn values<V: Clone + Send + 'static>(view: &SynchronizedView<i32, V>) -> Vec<i32> {
        view.snapshot().unwrap().into_iter().map(|(t, _)| t).collect()
    }

    #[test]
    fn move_is_mirrored() {
        let source = ObservableList::with_data(vec![10, 50, 30, 20, 40]);
        let view = source.create_view(|x| *x);

        assert_eq!(view.len(), 5);
        source.move_item(3, 1).unwrap();

        assert_eq!(values(&view), vec![10, 20, 50, 30, 40]);
    }

    #[test]
    fn replace_into_filter_reports_add() {
        let source = ObservableList::with_data(vec![10, 50, 30, 20, 40]);
        let view = source.create_view(|x| x.to_string());
        view.attach_filter_fn(|x, _| x % 3 == 0);
        assert_eq!(values(&view), vec![30]);

        let (_sub, log) = record(&view);
        source.set(0, 33).unwrap();

        assert_eq!(values(&view), vec![33, 30]);
        assert_eq!(view.len(), 2);
        assert_eq!(view.unfiltered_len(), 5);
        assert_eq!(
            *log.lock(),
            vec![ViewChangeRecord::Add {
                value: 33,
                view: "33".to_string(),
                index: 0,
            }]
        );
    }

    #[test]
    fn events_use_visible_indices() {
        let source = ObservableList::with_data(vec![1, 3, 5]);
        let view = source.create_view(|x| *x * 10);
        view.attach_filter_fn(|x, _| *x > 2);
        let (_sub, log) = record(&view);

        source.push(4);
        source.insert(0, 9).unwrap();
        source.remove_at(1).unwrap();
        source.remove_at(1).unwrap();
        source.set(1, 0).unwrap();

        assert_eq!(
            *log.lock(),
            vec![
                ViewChangeRecord::Add { value: 4, view: 40, index: 2 },
                ViewChangeRecord::Add { value: 9, view: 90, index: 0 },
                ViewChangeRecord::Remove { value: 3, view: 30, index: 1 },
                ViewChangeRecord::Remove { value: 5, view: 50, index: 1 },
            ]
        );
        assert_eq!(values(&view), vec![9, 4]);
    }

    #[test]
    fn replace_out_of_filter_reports_remove() {
        let source = ObservableList::with_data(vec![3, 6, 9]);
        let view = source.create_view(|x| *x);
        view.attach_filter_fn(|x, _| x % 3 == 0);
        let (_sub, log) = record(&view);

        source.set(1, 7).unwrap();
        source.set(1, 8).unwrap();
        source.set(2, 12).unwrap();

        assert_eq!(
            *log.lock(),
            vec![
                ViewChangeRecord::Remove { value: 6, view: 6, index: 1 },
                ViewChangeRecord::Replace {
                    new: (12, 12),
                    old: (9, 9),
                    index: 1,
                },
            ]
        );
    }

    #[test]
    fn move_of_hidden_entry_is_silent() {
        let source = ObservableList::with_data(vec![1, 2, 3, 4]);
        let view = source.create_view(|x| *x);
        view.attach_filter_fn(|x, _| x % 2 == 0);
        let (_sub, log) = record(&view);

        source.move_item(0, 3).unwrap();
        source.move_item(0, 2).unwrap();

        assert_eq!(
            *log.lock(),
            vec![ViewChangeRecord::Move {
                value: 2,
                view: 2,
                old_index: 0,
                new_index: 1,
            }]
        );
        assert_eq!(values(&view), vec![4, 2]);
    }

    #[test]
    fn reorders_are_replayed_in_lockstep() {
        let source = ObservableList::with_data(vec![5, 1, 4, 2, 3]);
        let view = source.create_view(|x| *x);
        let (_sub, log) = record(&view);

        source.sort_range_by(1, 3, |a, b| a.cmp(b)).unwrap();
        assert_eq!(values(&view), source.to_vec());

        source.reverse();
        assert_eq!(values(&view), vec![3, 4, 2, 1, 5]);
        assert_eq!(
            *log.lock(),
            vec![
                ViewChangeRecord::Reset(ResetRecord::Sort { index: 1, count: 3 }),
                ViewChangeRecord::Reset(ResetRecord::Reverse { index: 0, count: 5 }),
            ]
        );
    }

    #[test]
    fn count_follows_filter_and_clear() {
        let source = ObservableList::with_data(vec![1, 2, 3, 4]);
        let view = source.create_view(|x| *x);
        let counts = Arc::new(Mutex::new(Vec::new()));
        let c = counts.clone();
        let _sub = view.subscribe_count(move |n| c.lock().push(n));

        view.attach_filter_fn(|x, _| *x > 2);
        source.push(5);
        source.push(0);
        view.reset_filter();
        source.clear();

        assert_eq!(*counts.lock(), vec![2, 3, 6, 0]);
        assert!(!view.is_filtered());
    }

    #[test]
    fn reset_filter_visits_every_entry() {
        let source = ObservableList::with_data(vec![1, 2, 3]);
        let view = source.create_view(|x| *x);
        view.attach_filter_fn(|_, _| false);
        assert!(view.is_empty());

        let mut visited = Vec::new();
        view.reset_filter_with(|x, _| visited.push(*x));

        assert_eq!(visited, vec![1, 2, 3]);
        assert_eq!(view.len(), 3);
    }

    #[test]
    fn reversed_view_enumerates_backwards() {
        let source = ObservableList::with_data(vec![1, 2, 3]);
        let view = source.create_view_with(|x| *x, ViewOptions { reverse: true });

        source.push(4);

        assert_eq!(values(&view), vec![4, 3, 2, 1]);
        let guard = view.lock().unwrap();
        assert_eq!(guard.iter().next(), Some((&4, &4)));
        assert_eq!(guard.len(), 4);
    }

    #[test]
    fn disposed_view_stops_observing() {
        let source = ObservableList::with_data(vec![1, 2]);
        let view = source.create_view(|x| *x);
        let (_sub, log) = record(&view);

        view.dispose();
        view.dispose();
        source.push(3);
        view.attach_filter_fn(|_, _| true);

        assert!(view.is_disposed());
        assert!(log.lock().is_empty());
        assert_eq!(view.snapshot(), Err(Error::Disposed));
        assert!(view.lock().is_err());
        assert!(!view.subscribe(|_| {}).is_active());
    }

    #[test]
    fn dropped_view_detaches_from_source() {
        let source = ObservableList::with_data(vec![1]);
        let view = source.create_view(|x| *x);
        drop(view);

        source.push(2);
        assert_eq!(source.len(), 2);
    }

    #[test]
    fn observers_may_read_the_source() {
        let source = ObservableList::with_data(vec![1, 2]);
        let view = source.create_view(|x| *x);
        let reader = source.clone();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let s = seen.clone();
        let _sub = view.subscribe(move |_| s.lock().push((reader.len(), reader.get(0))));

        source.push(3);
        source.remove_at(0).unwrap();

        assert_eq!(*seen.lock(), vec![(3, Some(1)), (2, Some(2))]);
    }

    #[test]
    fn sibling_view_can_be_dropped_from_a_callback() {
        let source = ObservableList::with_data(vec![1]);
        let first = source.create_view(|x| *x);
        let second = Arc::new(Mutex::new(Some(source.create_view(|x| *x * 10))));
        let (_second_sub, second_log) = match second.lock().as_ref() {
            Some(view) => record(view),
            None => unreachable!(),
        };

        let s = second.clone();
        let _sub = first.subscribe(move |_| {
            s.lock().take();
        });

        source.push(2);
        source.push(3);

        assert!(second.lock().is_none());
        assert!(second_log.lock().is_empty());
        assert_eq!(values(&first), vec![1, 2, 3]);
    }

    #[test]
    fn subscription_can_be_cancelled_from_its_own_callback() {
        let source = ObservableList::new();
        let view = source.create_view(|x: &i32| *x);
        let slot: Arc<Mutex<Option<Subscription>>> = Arc::new(Mutex::new(None));
        let calls = Arc::new(Mutex::new(0));

        let (s, c) = (slot.clone(), calls.clone());
        *slot.lock() = Some(view.subscribe(move |_| {
            *c.lock() += 1;
            s.lock().take();
        }));

        source.push(1);
        source.push(2);

        assert_eq!(*calls.lock(), 1);
        assert_eq!(view.len(), 2);
    }

    #[test]
    fn keyless_remove_is_rejected() {
        let source = ObservableList::with_data(vec![1, 2]);
        let view = source.create_view(|x| *x);
        let rejections = Arc::new(Mutex::new(Vec::new()));
        let r = rejections.clone();
        let _sub = view.subscribe_rejections(move |rejection| r.lock().push(*rejection));

        {
            let _root = view.root.lock();
            view.state.lock().replay(&CollectionChange::Remove {
                items: Items::Single(&1),
                index: None,
            });
        }

        assert_eq!(*rejections.lock(), vec![Rejection::UnknownIndex { count: 1 }]);
        assert_eq!(view.unfiltered_len(), 2);
    }

    #[test]
    fn dispatches_records_through_a_channel() {
        use {crate::view::channel::queue_channel, async_std::stream::StreamExt};

        let source: ObservableList<i32> = ObservableList::new();
        let view = source.create_view(|x| x * 2);
        let (sender, mut receiver) = queue_channel();
        let _sub = view.dispatch_to(sender);

        source.push(1);
        source.clear();
        drop(_sub);

        let records: Vec<_> = async_std::task::block_on(async move {
            let mut records = Vec::new();
            while let Some(record) = receiver.next().await {
                records.push(record);
            }
            records
        });
        assert_eq!(
            records,
            vec![
                ViewChangeRecord::Add { value: 1, view: 2, index: 0 },
                ViewChangeRecord::Reset(ResetRecord::Clear),
            ]
        );
    }
}
