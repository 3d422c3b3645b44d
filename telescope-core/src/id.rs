//! # IDs
//! Strokes and cards need identities that outlive their position in whatever `Vec` currently holds
//! them. [`UniqueID<T>`] hands out process-unique IDs, namespaced by the marker type `T`.
//!
//! Frames do *not* use this - they live in an arena and are addressed by index, see
//! [`crate::frame::FrameId`].

// Next free value per namespace.
static ID_SERVER: parking_lot::RwLock<
    std::collections::BTreeMap<std::any::TypeId, std::sync::atomic::AtomicU64>,
> = parking_lot::const_rwlock(std::collections::BTreeMap::new());

/// ID that is unique within this run of the program, for the namespace `T`.
/// IDs of different namespaces may share a numeric value and are never comparable.
pub struct UniqueID<T: std::any::Any> {
    id: std::num::NonZeroU64,
    _namespace: std::marker::PhantomData<T>,
}
impl<T: std::any::Any> Clone for UniqueID<T> {
    fn clone(&self) -> Self {
        *self
    }
}
impl<T: std::any::Any> Copy for UniqueID<T> {}
impl<T: std::any::Any> PartialEq for UniqueID<T> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}
impl<T: std::any::Any> Eq for UniqueID<T> {}
impl<T: std::any::Any> std::hash::Hash for UniqueID<T> {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}
// The marker is never stored, so its auto traits shouldn't leak into the ID.
// Safety: the only field is a NonZeroU64.
unsafe impl<T: std::any::Any> Send for UniqueID<T> {}
unsafe impl<T: std::any::Any> Sync for UniqueID<T> {}

impl<T: std::any::Any> UniqueID<T> {
    /// Raw numeric value. Stable for the lifetime of the process only.
    #[must_use]
    pub fn get(&self) -> u64 {
        self.id.get()
    }
    /// Allocate a fresh ID.
    ///
    /// # Panics
    /// If the namespace has exhausted all `u64::MAX - 1` values, which would take a few centuries of
    /// drawing at any sensible pace.
    #[must_use]
    pub fn next() -> Self {
        let ty = std::any::TypeId::of::<T>();
        let value = {
            let read = ID_SERVER.upgradable_read();
            if let Some(counter) = read.get(&ty) {
                counter.fetch_add(1, std::sync::atomic::Ordering::Relaxed)
            } else {
                // First ID of this namespace, needs exclusive access to insert the counter.
                let mut write = parking_lot::RwLockUpgradableReadGuard::upgrade(read);
                // Someone may have raced us between the read and the upgrade.
                write
                    .entry(ty)
                    .or_insert_with(|| 1.into())
                    .fetch_add(1, std::sync::atomic::Ordering::Relaxed)
            }
        };
        Self {
            id: std::num::NonZeroU64::new(value).unwrap_or_else(|| {
                panic!("{} ID overflow", std::any::type_name::<T>())
            }),
            _namespace: std::marker::PhantomData,
        }
    }
}
impl<T: std::any::Any> std::fmt::Display for UniqueID<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // rsplit always yields at least one item.
        let name = std::any::type_name::<T>()
            .rsplit("::")
            .next()
            .unwrap_or_default();
        write!(f, "{name}#{}", self.id)
    }
}
impl<T: std::any::Any> std::fmt::Debug for UniqueID<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(self, f)
    }
}

#[cfg(test)]
mod test {
    use super::UniqueID;

    #[test]
    fn fresh_namespace_starts_at_one() {
        struct Namespace;
        let first = UniqueID::<Namespace>::next();
        let second = UniqueID::<Namespace>::next();
        // Not a guarantee anyone should rely on, but it's what the server does.
        assert_eq!(first.get(), 1);
        assert_eq!(second.get(), 2);
        assert_ne!(first, second);
    }
    #[test]
    fn unique_across_threads() {
        struct Namespace;
        let handles: Vec<_> = (0..4)
            .map(|_| {
                std::thread::spawn(|| {
                    (0..256)
                        .map(|_| UniqueID::<Namespace>::next().get())
                        .collect::<Vec<_>>()
                })
            })
            .collect();
        let mut all: Vec<u64> = handles
            .into_iter()
            .flat_map(|handle| handle.join().unwrap())
            .collect();
        let before = all.len();
        all.sort_unstable();
        all.dedup();
        assert_eq!(before, all.len(), "had duplicate ids");
    }
    #[test]
    fn display_uses_short_type_name() {
        struct Marker;
        let id = UniqueID::<Marker>::next();
        assert_eq!(id.to_string(), format!("Marker#{}", id.get()));
    }
}
