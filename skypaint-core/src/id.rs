//! # Handles
//! Scene visuals and erase markers need cheap ids that are unique for the life of the process,
//! but never leave it. This is `FuzzID<T>`, namespaced by the marker type `T`.
//!
//! Stroke ids are different - they survive a save and load, so they're uuids instead.
//! See [`crate::stroke::StrokeID`].

// Next free id, per namespace.
static ID_SERVER: parking_lot::RwLock<
    std::collections::BTreeMap<std::any::TypeId, std::sync::atomic::AtomicU64>,
> = parking_lot::const_rwlock(std::collections::BTreeMap::new());

/// ID that is guarunteed unique within this execution of the program.
/// IDs with different namespaces may share a value but should not be considered equal.
pub struct FuzzID<T: std::any::Any> {
    id: std::num::NonZeroU64,
    _phantom: std::marker::PhantomData<T>,
}
impl<T: std::any::Any> Clone for FuzzID<T> {
    fn clone(&self) -> Self {
        *self
    }
}
impl<T: std::any::Any> Copy for FuzzID<T> {}
impl<T: std::any::Any> PartialEq for FuzzID<T> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}
impl<T: std::any::Any> Eq for FuzzID<T> {}
impl<T: std::any::Any> PartialOrd for FuzzID<T> {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}
impl<T: std::any::Any> Ord for FuzzID<T> {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.id.cmp(&other.id)
    }
}

// Safety - no T is stored, only a u64. A !Send marker type shouldn't make
// the id itself !Send.
unsafe impl<T: std::any::Any> Send for FuzzID<T> {}
unsafe impl<T: std::any::Any> Sync for FuzzID<T> {}

impl<T: std::any::Any> std::hash::Hash for FuzzID<T> {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl<T: std::any::Any> FuzzID<T> {
    /// Get the raw numeric value of this ID.
    #[must_use]
    pub fn id(&self) -> u64 {
        self.id.get()
    }
    /// Allocate `count` ids in one go. Order of the returned ids is unspecified.
    ///
    /// Running the namespace out of ids aborts the process (panics under test),
    /// as there would be no way to hand out unique ids afterwards.
    pub fn many(count: usize) -> impl ExactSizeIterator<Item = Self> {
        let count_u64 = count as u64;
        let ty = std::any::TypeId::of::<T>();

        let start_id = {
            let read = ID_SERVER.upgradable_read();
            if let Some(next) = read.get(&ty) {
                next.fetch_add(count_u64, std::sync::atomic::Ordering::Relaxed)
            } else {
                // First allocation in this namespace.
                let mut write = parking_lot::RwLockUpgradableReadGuard::upgrade(read);
                let next = write
                    .entry(ty)
                    .or_insert_with(|| std::sync::atomic::AtomicU64::new(1));
                next.fetch_add(count_u64, std::sync::atomic::Ordering::Relaxed)
            }
        };

        #[allow(clippy::manual_assert)]
        if start_id.checked_add(count_u64).is_none() {
            #[cfg(not(test))]
            {
                log::error!("{} ID overflow! Aborting!", std::any::type_name::<T>());
                log::logger().flush();
                std::process::abort();
            }
            #[cfg(test)]
            {
                panic!("{} ID overflow! Aborting!", std::any::type_name::<T>())
            }
        }

        (0..count).map(move |idx| FuzzID {
            // Non-zero: the server starts at one and overflow is caught above.
            id: std::num::NonZeroU64::new(start_id + idx as u64).unwrap(),
            _phantom: std::marker::PhantomData,
        })
    }
}
impl<T: std::any::Any> Default for FuzzID<T> {
    fn default() -> Self {
        Self::many(1).next().unwrap()
    }
}
impl<T: std::any::Any> std::fmt::Display for FuzzID<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // rsplit always yields at least one element.
        write!(
            f,
            "{}#{}",
            std::any::type_name::<T>().rsplit("::").next().unwrap(),
            self.id
        )
    }
}
impl<T: std::any::Any> std::fmt::Debug for FuzzID<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        <Self as std::fmt::Display>::fmt(self, f)
    }
}

#[cfg(test)]
mod test {
    use super::FuzzID;
    // Each test gets its own namespace, the id server is process-global.

    #[test]
    fn zero_count_is_fine() {
        struct Namespace;
        type TestID = FuzzID<Namespace>;

        assert_eq!(TestID::many(0).len(), 0);
        let first = TestID::default();
        let second = TestID::default();
        assert_ne!(first, second);
    }
    #[test]
    fn bulk_ids_unique() {
        struct Namespace;
        type TestID = FuzzID<Namespace>;

        let mut ids: Vec<_> = TestID::many(512).chain(TestID::many(512)).collect();
        ids.sort_unstable();
        let before = ids.len();
        ids.dedup();
        assert_eq!(before, ids.len(), "had duplicate ids");
    }
    #[test]
    fn display_names_namespace() {
        struct Marker;
        let id = FuzzID::<Marker>::default();
        assert!(id.to_string().starts_with("Marker#"));
    }
    #[cfg(target_pointer_width = "64")]
    #[test]
    #[should_panic(expected = "ID overflow")]
    fn overflow() {
        struct Namespace;
        type TestID = FuzzID<Namespace>;

        let _ = TestID::many((u64::MAX - 1) as usize);
        let _ = TestID::many(1);
    }
}
