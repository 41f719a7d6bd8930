// 2022-2025 (c) Copyright Contributors to the GOSH DAO. All rights reserved.
//

use std::sync::Arc;

use parking_lot::Mutex;

/// Runs a closure against the locked value. The lock is held only for the
/// duration of the closure.
pub trait Guarded<Inner> {
    fn guarded<F, T>(&self, action: F) -> T
    where
        F: FnOnce(&Inner) -> T;
}

pub trait GuardedMut<Inner> {
    fn guarded_mut<F, T>(&self, action: F) -> T
    where
        F: FnOnce(&mut Inner) -> T;
}

impl<Inner> Guarded<Inner> for Mutex<Inner> {
    fn guarded<F, T>(&self, action: F) -> T
    where
        F: FnOnce(&Inner) -> T,
    {
        let guard = self.lock();
        let result = action(&guard);
        drop(guard);
        result
    }
}

impl<Inner> GuardedMut<Inner> for Mutex<Inner> {
    fn guarded_mut<F, T>(&self, action: F) -> T
    where
        F: FnOnce(&mut Inner) -> T,
    {
        let mut guard = self.lock();
        let result = action(&mut guard);
        drop(guard);
        result
    }
}

impl<Inner> Guarded<Inner> for Arc<Mutex<Inner>> {
    fn guarded<F, T>(&self, action: F) -> T
    where
        F: FnOnce(&Inner) -> T,
    {
        self.as_ref().guarded(action)
    }
}

impl<Inner> GuardedMut<Inner> for Arc<Mutex<Inner>> {
    fn guarded_mut<F, T>(&self, action: F) -> T
    where
        F: FnOnce(&mut Inner) -> T,
    {
        self.as_ref().guarded_mut(action)
    }
}
