//! Thread-local object pools with scoped checkout
//!
//! Rules that walk subtrees reuse their walker objects instead of allocating
//! one per node. A pool lives in `thread_local!` storage, so instances are
//! never shared across threads. Checkout hands out an RAII guard; dropping the
//! guard resets the instance and returns it, on every exit path. If the thread
//! is unwinding from a panic the instance is discarded instead, so a half
//! updated walker can never be handed out again.
//!
//! ```rust,ignore
//! thread_local! {
//!     static WALKERS: Pool<NameCollector> = Pool::new();
//! }
//!
//! let names = WALKERS.with(|pool| {
//!     let mut walker = pool.checkout();
//!     walker.visit(&node);
//!     walker.names.clone()
//! });
//! ```

use std::cell::RefCell;
use std::ops::{Deref, DerefMut};

/// Objects that can be cleared for reuse
pub trait Reset {
    /// Clear every rule-specific field
    fn reset(&mut self);
}

/// Upper bound on idle instances kept per pool
const MAX_IDLE: usize = 8;

/// A single-thread pool of reusable objects
#[derive(Debug, Default)]
pub struct Pool<T> {
    idle: RefCell<Vec<T>>,
}

impl<T: Reset + Default> Pool<T> {
    pub fn new() -> Self {
        Self {
            idle: RefCell::new(Vec::new()),
        }
    }

    /// Check out an instance, creating one when the pool is empty
    pub fn checkout(&self) -> Pooled<'_, T> {
        let mut value = self.idle.borrow_mut().pop().unwrap_or_default();
        value.reset();
        Pooled {
            pool: self,
            value: Some(value),
        }
    }

    /// Number of idle instances currently held
    pub fn idle_count(&self) -> usize {
        self.idle.borrow().len()
    }

    fn give_back(&self, mut value: T) {
        value.reset();
        let mut idle = self.idle.borrow_mut();
        if idle.len() < MAX_IDLE {
            idle.push(value);
        }
    }
}

/// Scoped checkout of a pooled instance
#[derive(Debug)]
pub struct Pooled<'p, T: Reset + Default> {
    pool: &'p Pool<T>,
    value: Option<T>,
}

impl<T: Reset + Default> Deref for Pooled<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        match &self.value {
            Some(value) => value,
            None => unreachable!("pooled value is only taken on drop"),
        }
    }
}

impl<T: Reset + Default> DerefMut for Pooled<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        match &mut self.value {
            Some(value) => value,
            None => unreachable!("pooled value is only taken on drop"),
        }
    }
}

impl<T: Reset + Default> Drop for Pooled<'_, T> {
    fn drop(&mut self) {
        let Some(value) = self.value.take() else {
            return;
        };
        if std::thread::panicking() {
            tracing::debug!("Discarding pooled instance checked out during a panic");
            return;
        }
        self.pool.give_back(value);
    }
}
