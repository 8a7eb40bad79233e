
                    /*\
<<<<>>>><<>><><<>><<<*>>><<>><><<>><<<<>>>>
                Projections
<<<<>>>><<>><><<>><<<*>>><<>><><<>><<<<>>>>
                    \*/

//! Views derived from a source collection.
//!
//! [`SynchronizedView`] mirrors a positional source entry by entry,
//! [`SortedView`] keeps its own order. Both transform each element once,
//! can carry a [`ViewFilter`] and report their changes in visible
//! coordinates. [`ViewList`] rebuilds the flat visible list from those
//! changes alone.

pub mod filter;
pub mod sorted;
pub mod synchronized;
pub mod view_list;

pub use {
    filter::{FilterState, FnFilter, Transition, ViewFilter},
    sorted::{SortKey, SortedGuard, SortedView},
    synchronized::{SynchronizedView, ViewGuard},
    view_list::ViewList,
};

use {
    crate::{
        error::Result,
        view::{
            observer::{ObserverList, Subscription, ViewBroadcast},
            source::ObservableCollection,
        },
    },
    parking_lot::Mutex,
    serde::{Deserialize, Serialize},
    std::{cmp::Ordering, hash::Hash, sync::Arc},
};

//<<<<>>>><<>><><<>><<<*>>><<>><><<>><<<<>>>>

/// Construction options of a [`SynchronizedView`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewOptions {
    /// Enumerate the view back to front. Event indices are unaffected.
    pub reverse: bool,
}

//<<<<>>>><<>><><<>><<<*>>><<>><><<>><<<<>>>>

/// View state that owns an outgoing broadcast, which is gone once the view
/// is disposed.
pub(crate) trait ViewCell<T, V>: Send + 'static {
    fn broadcast(&self) -> Option<&ViewBroadcast<T, V>>;
}

/// Registers `observer` on the list picked by `select`. The returned
/// subscription only holds a weak reference to that list, so cancelling it
/// never locks the view.
pub(crate) fn observe<S, T, V, F>(
    state: &Arc<Mutex<S>>,
    observer: Box<F>,
    select: fn(&ViewBroadcast<T, V>) -> &Arc<ObserverList<F>>,
) -> Subscription
where
    S: ViewCell<T, V>,
    T: 'static,
    V: 'static,
    F: ?Sized + Send + 'static,
{
    let list = match state.lock().broadcast() {
        Some(cast) => select(cast).clone(),
        None => return Subscription::inactive(),
    };

    let id = list.add(observer);
    let weak = Arc::downgrade(&list);
    Subscription::new(id, move |id| {
        if let Some(list) = weak.upgrade() {
            list.remove(id);
        }
    })
}

//<<<<>>>><<>><><<>><<<*>>><<>><><<>><<<<>>>>

/// View constructors for every observable source.
pub trait ViewExt<T>: ObservableCollection<T> {
    fn create_view<V>(&self, transform: impl Fn(&T) -> V + Send + 'static) -> SynchronizedView<T, V>
    where
        T: Clone + Send + 'static,
        V: Send + 'static,
    {
        SynchronizedView::new(self, transform, ViewOptions::default())
    }

    fn create_view_with<V>(
        &self,
        transform: impl Fn(&T) -> V + Send + 'static,
        options: ViewOptions,
    ) -> SynchronizedView<T, V>
    where
        T: Clone + Send + 'static,
        V: Send + 'static,
    {
        SynchronizedView::new(self, transform, options)
    }

    /// A view ordered by `compare` on the source values, ties broken by
    /// `identity`.
    fn create_sorted_view<V, K>(
        &self,
        identity: impl Fn(&T) -> K + Send + 'static,
        transform: impl Fn(&T) -> V + Send + 'static,
        compare: impl Fn(&T, &T) -> Ordering + Send + 'static,
    ) -> Result<SortedView<T, V, K>>
    where
        T: Clone + Send + 'static,
        V: Send + 'static,
        K: Ord + Hash + Clone + Send + 'static,
    {
        SortedView::new(self, identity, transform, SortKey::ByValue(Box::new(compare)))
    }

    /// A view ordered by `compare` on the transformed views, ties broken by
    /// `identity`.
    fn create_sorted_view_by_view<V, K>(
        &self,
        identity: impl Fn(&T) -> K + Send + 'static,
        transform: impl Fn(&T) -> V + Send + 'static,
        compare: impl Fn(&V, &V) -> Ordering + Send + 'static,
    ) -> Result<SortedView<T, V, K>>
    where
        T: Clone + Send + 'static,
        V: Send + 'static,
        K: Ord + Hash + Clone + Send + 'static,
    {
        SortedView::new(self, identity, transform, SortKey::ByView(Box::new(compare)))
    }
}

impl<T, S> ViewExt<T> for S where S: ObservableCollection<T> + ?Sized {}

//<<<<>>>><<>><><<>><<<*>>><<>><><<>><<<<>>>>
