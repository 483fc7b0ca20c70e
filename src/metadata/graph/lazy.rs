use std::{fmt, sync::Arc, sync::RwLock};

use crate::Result;

/// A lazily computed, resettable value shared by every holder of a member wrapper.
///
/// The first access computes the value without holding the lock and then installs it, unless a
/// racing thread installed one first, in which case the freshly computed value is dropped and
/// the installed one returned. All readers observe the same `Arc` until [`LazyField::clear`]
/// empties the slot again.
pub struct LazyField<T: ?Sized> {
    slot: RwLock<Option<Arc<T>>>,
}

impl<T: ?Sized> LazyField<T> {
    /// An empty slot.
    #[must_use]
    pub fn new() -> Self {
        LazyField {
            slot: RwLock::new(None),
        }
    }

    /// The installed value, if any.
    pub fn get(&self) -> Option<Arc<T>> {
        read_lock!(self.slot).clone()
    }

    /// The installed value, computing and installing it first if the slot is empty.
    pub fn get_or_init(&self, init: impl FnOnce() -> Arc<T>) -> Arc<T> {
        if let Some(value) = self.get() {
            return value;
        }

        let computed = init();
        self.install(computed)
    }

    /// Like [`LazyField::get_or_init`], for computations that can fail. A failure leaves the
    /// slot empty.
    ///
    /// # Errors
    /// Propagates the error returned by `init`.
    pub fn get_or_try_init(&self, init: impl FnOnce() -> Result<Arc<T>>) -> Result<Arc<T>> {
        if let Some(value) = self.get() {
            return Ok(value);
        }

        let computed = init()?;
        Ok(self.install(computed))
    }

    /// Empty the slot so that the next access recomputes it.
    pub fn clear(&self) {
        *write_lock!(self.slot) = None;
    }

    /// Whether a value is installed.
    pub fn is_initialized(&self) -> bool {
        read_lock!(self.slot).is_some()
    }

    fn install(&self, computed: Arc<T>) -> Arc<T> {
        let mut slot = write_lock!(self.slot);
        match &*slot {
            Some(winner) => winner.clone(),
            None => {
                *slot = Some(computed.clone());
                computed
            }
        }
    }
}

impl<T: ?Sized> Default for LazyField<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ?Sized + fmt::Debug> fmt::Debug for LazyField<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.get() {
            Some(value) => f.debug_tuple("LazyField").field(&value).finish(),
            None => f.write_str("LazyField(<uninit>)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Barrier,
    };

    #[test]
    fn computes_once_until_cleared() {
        let field = LazyField::<str>::new();
        let calls = AtomicUsize::new(0);
        let compute = || {
            calls.fetch_add(1, Ordering::SeqCst);
            Arc::<str>::from("System.Object")
        };

        let first = field.get_or_init(compute);
        let second = field.get_or_init(compute);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        field.clear();
        assert!(!field.is_initialized());
        let third = field.get_or_init(compute);
        assert_eq!(&*third, "System.Object");
        assert!(!Arc::ptr_eq(&first, &third));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn failed_init_leaves_slot_empty() {
        let field = LazyField::<u32>::new();
        assert!(field
            .get_or_try_init(|| Err(malformed_error!("no value")))
            .is_err());
        assert!(field.get().is_none());
        assert_eq!(*field.get_or_try_init(|| Ok(Arc::new(7))).unwrap(), 7);
    }

    #[test]
    fn racing_initializers_agree_on_one_value() {
        let field = Arc::new(LazyField::<u64>::new());
        let barrier = Arc::new(Barrier::new(8));

        let handles: Vec<_> = (0..8u64)
            .map(|seed| {
                let field = field.clone();
                let barrier = barrier.clone();
                std::thread::spawn(move || {
                    barrier.wait();
                    field.get_or_init(|| Arc::new(seed))
                })
            })
            .collect();

        let results: Vec<Arc<u64>> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        let installed = field.get().unwrap();
        for result in &results {
            assert!(Arc::ptr_eq(result, &installed));
        }
    }
}
