//! Cooperative cancellation of in-flight region decodes.
//!
//! A [`CancelSignal`] is held by whoever may want to abort a decode. While a
//! decode runs, a [`CancelGuard`] registers a per-operation flag with the
//! signal; the signal only keeps weak references to those flags, each tagged
//! with a generation number. Clones of one signal may guard several decodes
//! at once, and a request flags every one of them. Each guard removes only its
//! own registration on drop, on every exit path.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use enough::{Stop, StopReason};

struct Registration {
    generation: u64,
    flag: Weak<AtomicBool>,
}

#[derive(Default)]
struct Shared {
    /// Sticky until [`CancelSignal::reset`].
    requested: AtomicBool,
    next_generation: AtomicU64,
    active: Mutex<Vec<Registration>>,
}

impl Shared {
    fn active(&self) -> MutexGuard<'_, Vec<Registration>> {
        self.active.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Requests cancellation of the decode it is attached to.
///
/// Cloning shares the same signal. Safe to call from any thread at any time.
#[derive(Clone, Default)]
pub struct CancelSignal {
    shared: Arc<Shared>,
}

impl CancelSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation.
    ///
    /// A decode that has not started yet fails with
    /// [`RegionError::Cancelled`](crate::RegionError::Cancelled) before touching
    /// the backend. Every decode in flight on this signal or its clones
    /// aborts at its next checkpoint. Returns whether any live decode was
    /// flagged.
    pub fn request_cancel(&self) -> bool {
        self.shared.requested.store(true, Ordering::SeqCst);
        let active = self.shared.active();
        let mut flagged = false;
        for flag in active.iter().filter_map(|reg| reg.flag.upgrade()) {
            flag.store(true, Ordering::SeqCst);
            flagged = true;
        }
        flagged
    }

    pub fn is_requested(&self) -> bool {
        self.shared.requested.load(Ordering::SeqCst)
    }

    /// Clear a previous request so the signal can guard another decode.
    pub fn reset(&self) {
        self.shared.requested.store(false, Ordering::SeqCst);
    }

    /// Whether any decode is currently registered with this signal.
    pub fn is_active(&self) -> bool {
        self.active_count() > 0
    }

    /// Number of decodes currently registered with this signal.
    pub fn active_count(&self) -> usize {
        self.shared
            .active()
            .iter()
            .filter(|reg| reg.flag.strong_count() > 0)
            .count()
    }
}

impl fmt::Debug for CancelSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CancelSignal")
            .field("requested", &self.is_requested())
            .field("active", &self.is_active())
            .finish()
    }
}

/// Scoped registration of one decode with an optional [`CancelSignal`].
///
/// Also forwards an optional caller-supplied [`Stop`] (a deadline, say), so
/// backends poll a single token.
pub(crate) struct CancelGuard<'a> {
    registered: Option<(Arc<Shared>, u64)>,
    flag: Arc<AtomicBool>,
    extra: Option<&'a dyn Stop>,
}

impl<'a> CancelGuard<'a> {
    pub(crate) fn register(signal: Option<&CancelSignal>, extra: Option<&'a dyn Stop>) -> Self {
        let flag = Arc::new(AtomicBool::new(false));
        let registered = signal.map(|signal| {
            let shared = Arc::clone(&signal.shared);
            let generation = shared.next_generation.fetch_add(1, Ordering::SeqCst);
            shared.active().push(Registration {
                generation,
                flag: Arc::downgrade(&flag),
            });
            log::debug!("cancel guard registered (generation {generation})");
            (shared, generation)
        });
        Self {
            registered,
            flag,
            extra,
        }
    }

    /// Catch a request that arrived before registration.
    pub(crate) fn precheck(&self) -> Result<(), StopReason> {
        if let Some((shared, _)) = &self.registered {
            if shared.requested.load(Ordering::SeqCst) {
                return Err(StopReason::Cancelled);
            }
        }
        self.check()
    }
}

impl Stop for CancelGuard<'_> {
    fn check(&self) -> Result<(), StopReason> {
        if self.flag.load(Ordering::Relaxed) {
            return Err(StopReason::Cancelled);
        }
        match self.extra {
            Some(stop) => stop.check(),
            None => Ok(()),
        }
    }
}

impl Drop for CancelGuard<'_> {
    fn drop(&mut self) {
        if let Some((shared, generation)) = self.registered.take() {
            shared.active().retain(|reg| reg.generation != generation);
        }
    }
}
