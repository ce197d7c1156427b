//! Ordered locks for the engine's shared state.
//!
//! Only two cells are shared between threads: the settings snapshot and the
//! WHOX field tracker. Both are wrapped so that, in debug builds, acquiring
//! them out of order panics before it can deadlock.
//!
//! Rule: while holding a lock, only acquire locks of a strictly higher
//! [`LockLevel::rank`]. Never hold either lock across a host callback.

use std::ops::{Deref, DerefMut};
use std::sync::{Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Where a lock sits in the acquisition order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockLevel {
    /// The `Arc<Settings>` swapped on reload.
    Settings,
    /// The process-wide negotiated WHOX nick field.
    WhoFieldTracker,
}

impl LockLevel {
    /// Lower ranks are taken first when nesting.
    #[must_use]
    pub const fn rank(self) -> u8 {
        match self {
            Self::Settings => 10,
            Self::WhoFieldTracker => 20,
        }
    }
}

#[cfg(debug_assertions)]
mod held {
    use std::cell::RefCell;

    use super::LockLevel;

    thread_local! {
        static STACK: RefCell<Vec<LockLevel>> = const { RefCell::new(Vec::new()) };
    }

    pub(super) fn enter(level: LockLevel) {
        STACK.with(|stack| {
            let stack = stack.borrow();
            if let Some(top) = stack.last() {
                assert!(
                    level.rank() > top.rank(),
                    "lock order violation: {level:?} requested while holding {top:?} (held: {:?})",
                    stack.as_slice()
                );
            }
        });
    }

    pub(super) fn push(level: LockLevel) {
        STACK.with(|stack| stack.borrow_mut().push(level));
    }

    pub(super) fn pop(level: LockLevel) {
        STACK.with(|stack| {
            let popped = stack.borrow_mut().pop();
            assert_eq!(popped, Some(level), "locks released out of order");
        });
    }
}

/// Marks one level as held by the current thread until dropped.
///
/// Declared after the std guard in every wrapper so the lock is released
/// before the level is popped.
#[derive(Debug)]
#[cfg_attr(not(debug_assertions), allow(dead_code))]
struct Held(LockLevel);

impl Held {
    fn acquire<G>(level: LockLevel, take: impl FnOnce() -> G) -> (G, Self) {
        #[cfg(debug_assertions)]
        held::enter(level);
        let guard = take();
        #[cfg(debug_assertions)]
        held::push(level);
        (guard, Self(level))
    }
}

impl Drop for Held {
    fn drop(&mut self) {
        #[cfg(debug_assertions)]
        held::pop(self.0);
    }
}

/// `Mutex` with a place in the lock order. Poisoning is ignored.
#[derive(Debug)]
pub struct OrderedMutex<T> {
    level: LockLevel,
    inner: Mutex<T>,
}

impl<T> OrderedMutex<T> {
    #[must_use]
    pub const fn new(level: LockLevel, value: T) -> Self {
        Self {
            level,
            inner: Mutex::new(value),
        }
    }

    pub fn lock(&self) -> OrderedMutexGuard<'_, T> {
        let (guard, held) = Held::acquire(self.level, || {
            self.inner.lock().unwrap_or_else(PoisonError::into_inner)
        });
        OrderedMutexGuard { guard, _held: held }
    }
}

pub struct OrderedMutexGuard<'a, T> {
    guard: MutexGuard<'a, T>,
    _held: Held,
}

/// `RwLock` with a place in the lock order.
#[derive(Debug)]
pub struct OrderedRwLock<T> {
    level: LockLevel,
    inner: RwLock<T>,
}

impl<T> OrderedRwLock<T> {
    #[must_use]
    pub const fn new(level: LockLevel, value: T) -> Self {
        Self {
            level,
            inner: RwLock::new(value),
        }
    }

    pub fn read(&self) -> OrderedReadGuard<'_, T> {
        let (guard, held) = Held::acquire(self.level, || {
            self.inner.read().unwrap_or_else(PoisonError::into_inner)
        });
        OrderedReadGuard { guard, _held: held }
    }

    pub fn write(&self) -> OrderedWriteGuard<'_, T> {
        let (guard, held) = Held::acquire(self.level, || {
            self.inner.write().unwrap_or_else(PoisonError::into_inner)
        });
        OrderedWriteGuard { guard, _held: held }
    }
}

pub struct OrderedReadGuard<'a, T> {
    guard: RwLockReadGuard<'a, T>,
    _held: Held,
}

pub struct OrderedWriteGuard<'a, T> {
    guard: RwLockWriteGuard<'a, T>,
    _held: Held,
}

macro_rules! deref_to_guard {
    ($($guard:ident),+ $(,)?) => {$(
        impl<T> Deref for $guard<'_, T> {
            type Target = T;

            fn deref(&self) -> &T {
                &self.guard
            }
        }
    )+};
}

deref_to_guard!(OrderedMutexGuard, OrderedReadGuard, OrderedWriteGuard);

impl<T> DerefMut for OrderedMutexGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.guard
    }
}

impl<T> DerefMut for OrderedWriteGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.guard
    }
}
