use {
    parking_lot::{ReentrantMutex, ReentrantMutexGuard},
    std::sync::Arc,
};

/// The lock shared by a source collection and every view derived from it.
///
/// A source mutation and its replay into all live views happen while one
/// thread holds this lock. It is reentrant so that an observer may read the
/// source, or another view of it, from inside a notification.
#[derive(Clone, Default)]
pub struct SyncRoot(Arc<ReentrantMutex<()>>);

impl SyncRoot {
    pub fn new() -> Self {
        SyncRoot(Arc::new(ReentrantMutex::new(())))
    }

    pub fn lock(&self) -> ReentrantMutexGuard<'_, ()> {
        self.0.lock()
    }

    /// Whether both handles refer to the same lock.
    pub fn same_as(&self, other: &SyncRoot) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl std::fmt::Debug for SyncRoot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("SyncRoot")
            .field(&Arc::as_ptr(&self.0))
            .finish()
    }
}
