//! Synchronization primitives with conditional compilation.
//!
//! Provides unified mutex and read-write lock interfaces that use
//! `parking_lot` when the `fast-lock` feature is enabled, falling back to
//! `std::sync` otherwise.
//!
//! Session state is guarded by one [`Mutex`] per session; documents are
//! guarded by a [`RwLock`] so a render pass can hold a consistent read view
//! while edits wait.

#[cfg(feature = "fast-lock")]
pub use parking_lot::{Mutex, MutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};

#[cfg(not(feature = "fast-lock"))]
pub use std::sync::{Mutex, MutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Lock a mutex and return the guard, handling poisoning gracefully.
///
/// For `parking_lot::Mutex`, this is just `mutex.lock()`.
/// For `std::sync::Mutex`, this recovers the guard from a poisoned lock.
///
/// # Example
///
/// ```rust
/// use visor::sync::{lock, Mutex};
///
/// let mutex = Mutex::new(42);
/// *lock(&mutex) = 100;
/// assert_eq!(*lock(&mutex), 100);
/// ```
#[cfg(feature = "fast-lock")]
pub fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock()
}

/// Lock a mutex, recovering the guard if a previous holder panicked.
#[cfg(not(feature = "fast-lock"))]
pub fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

/// Acquire shared read access.
#[cfg(feature = "fast-lock")]
pub fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read()
}

/// Acquire shared read access, recovering from poisoning.
#[cfg(not(feature = "fast-lock"))]
pub fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(|e| e.into_inner())
}

/// Acquire exclusive write access.
#[cfg(feature = "fast-lock")]
pub fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write()
}

/// Acquire exclusive write access, recovering from poisoning.
#[cfg(not(feature = "fast-lock"))]
pub fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(|e| e.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_rwlock_readers_see_whole_writes() {
        let shared = Arc::new(RwLock::new(vec![0u32; 8]));

        let writer = {
            let shared = Arc::clone(&shared);
            thread::spawn(move || {
                for round in 1..=200u32 {
                    let mut guard = write(&shared);
                    for slot in guard.iter_mut() {
                        *slot = round;
                    }
                }
            })
        };

        for _ in 0..200 {
            let guard = read(&shared);
            let first = guard[0];
            assert!(guard.iter().all(|&v| v == first), "torn read: {:?}", *guard);
        }
        writer.join().unwrap();
    }

    #[test]
    fn test_mutex_counts() {
        let counter = Arc::new(Mutex::new(0usize));
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let counter = Arc::clone(&counter);
                thread::spawn(move || {
                    for _ in 0..100 {
                        *lock(&counter) += 1;
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(*lock(&counter), 400);
    }
}
