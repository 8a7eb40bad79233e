use crate::view::{observer::ChangeObserver, observer::Subscription, sync_root::SyncRoot};

/// What a view needs from the collection it mirrors.
///
/// Implementations must hold their [`SyncRoot`] while emitting, and must
/// deliver every mutation to every subscriber in the order it happened.
pub trait ObservableCollection<T> {
    fn sync_root(&self) -> SyncRoot;

    /// Under the sync root: feed every current element to `snapshot` in
    /// source order, then register `observer` for all later mutations.
    ///
    /// Nothing can be mutated between the snapshot and the registration,
    /// so the subscriber neither misses nor double-counts an element.
    fn subscribe_with_snapshot(
        &self,
        snapshot: &mut dyn FnMut(&T),
        observer: Box<ChangeObserver<T>>,
    ) -> Subscription;
}
