use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

// The guarded maps are append-only, a panicking writer can't leave them half-updated.

pub(crate) fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

pub(crate) fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}
