use {
    crate::view::{
        change::CollectionChange,
        view_change::{Rejection, ViewChange},
    },
    parking_lot::Mutex,
    std::sync::Arc,
    tracing::{trace, warn},
};

                    /*\
<<<<>>>><<>><><<>><<<*>>><<>><><<>><<<<>>>>
                 Observers
<<<<>>>><<>><><<>><<<*>>><<>><><<>><<<<>>>>
                    \*/

/// Callback registered on a source collection.
pub type ChangeObserver<T> = dyn FnMut(&CollectionChange<'_, T>) + Send;

/// Callback registered on a view.
pub type ViewObserver<T, V> = dyn FnMut(&ViewChange<'_, T, V>) + Send;

/// Receives the new visible count.
pub type CountObserver = dyn FnMut(usize) + Send;

pub type RejectionObserver = dyn FnMut(&Rejection) + Send;

//<<<<>>>><<>><><<>><<<*>>><<>><><<>><<<<>>>>

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

struct Registry<F: ?Sized> {
    next_id: u64,
    observers: Vec<(SubscriptionId, Arc<Mutex<Box<F>>>)>,
}

/// Ordered set of callbacks.
///
/// Observers are notified in registration order. Removing an id that is not
/// (or no longer) registered does nothing.
///
/// The registry lock is only held to copy the current observers, never while
/// one of them runs. A callback may therefore add or cancel subscriptions on
/// the list that is notifying it. An observer cancelled mid-notification is
/// not called again, one added mid-notification first hears the next change.
pub struct ObserverList<F: ?Sized> {
    registry: Mutex<Registry<F>>,
}

impl<F: ?Sized> ObserverList<F> {
    pub fn new() -> Self {
        ObserverList {
            registry: Mutex::new(Registry {
                next_id: 0,
                observers: Vec::new(),
            }),
        }
    }

    pub fn add(&self, observer: Box<F>) -> SubscriptionId {
        let mut registry = self.registry.lock();
        let id = SubscriptionId(registry.next_id);
        registry.next_id += 1;
        registry.observers.push((id, Arc::new(Mutex::new(observer))));
        id
    }

    pub fn remove(&self, id: SubscriptionId) -> bool {
        let mut registry = self.registry.lock();
        let before = registry.observers.len();
        registry.observers.retain(|(other, _)| *other != id);
        registry.observers.len() != before
    }

    pub fn contains(&self, id: SubscriptionId) -> bool {
        self.registry
            .lock()
            .observers
            .iter()
            .any(|(other, _)| *other == id)
    }

    pub fn len(&self) -> usize {
        self.registry.lock().observers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.registry.lock().observers.clear();
    }

    pub fn for_each(&self, mut f: impl FnMut(&mut F)) {
        let current: Vec<_> = self
            .registry
            .lock()
            .observers
            .iter()
            .map(|(id, observer)| (*id, observer.clone()))
            .collect();

        for (id, observer) in current {
            if self.contains(id) {
                f(&mut **observer.lock());
            }
        }
    }
}

impl<F: ?Sized> Default for ObserverList<F> {
    fn default() -> Self {
        ObserverList::new()
    }
}

impl<F: ?Sized> std::fmt::Debug for ObserverList<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObserverList")
            .field("len", &self.len())
            .finish()
    }
}

//<<<<>>>><<>><><<>><<<*>>><<>><><<>><<<<>>>>

/// Handle to a callback registered on a source.
///
/// Cancelling is idempotent and also happens on drop.
pub struct Subscription {
    id: SubscriptionId,
    detach: Option<Box<dyn FnOnce(SubscriptionId) + Send>>,
}

impl Subscription {
    pub fn new(id: SubscriptionId, detach: impl FnOnce(SubscriptionId) + Send + 'static) -> Self {
        Subscription {
            id,
            detach: Some(Box::new(detach)),
        }
    }

    /// A handle that was never attached, returned by disposed views.
    pub fn inactive() -> Self {
        Subscription {
            id: SubscriptionId(u64::MAX),
            detach: None,
        }
    }

    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    pub fn is_active(&self) -> bool {
        self.detach.is_some()
    }

    pub fn cancel(&mut self) {
        if let Some(detach) = self.detach.take() {
            detach(self.id);
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("active", &self.is_active())
            .finish()
    }
}

                    /*\
<<<<>>>><<>><><<>><<<*>>><<>><><<>><<<<>>>>
                 Broadcast
<<<<>>>><<>><><<>><<<*>>><<>><><<>><<<<>>>>
                    \*/

/// The three outgoing streams of a view.
///
/// The lists are shared so that a subscription can detach from its list
/// without locking the view that owns it.
pub struct ViewBroadcast<T, V> {
    pub changes: Arc<ObserverList<ViewObserver<T, V>>>,
    pub counts: Arc<ObserverList<CountObserver>>,
    pub rejections: Arc<ObserverList<RejectionObserver>>,
}

impl<T, V> ViewBroadcast<T, V> {
    pub fn new() -> Self {
        ViewBroadcast {
            changes: Arc::new(ObserverList::new()),
            counts: Arc::new(ObserverList::new()),
            rejections: Arc::new(ObserverList::new()),
        }
    }

    pub fn notify(&self, change: &ViewChange<'_, T, V>) {
        trace!(kind = change.kind(), index = ?change.index(), "view changed");
        self.changes.for_each(|observer| observer(change));
    }

    pub fn count_changed(&self, count: usize) {
        self.counts.for_each(|observer| observer(count));
    }

    pub fn reject(&self, rejection: Rejection) {
        warn!(?rejection, "view rejected a source mutation");
        self.rejections.for_each(|observer| observer(&rejection));
    }

    pub fn clear(&self) {
        self.changes.clear();
        self.counts.clear();
        self.rejections.clear();
    }
}

impl<T, V> Default for ViewBroadcast<T, V> {
    fn default() -> Self {
        ViewBroadcast::new()
    }
}

//<<<<>>>><<>><><<>><<<*>>><<>><><<>><<<<>>>>
