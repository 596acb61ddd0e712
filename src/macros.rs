#![allow(unused_macros)]

// No handler code runs while one of these locks is held; a poisoned lock is
// recovered rather than propagated.

/// Helper macro for locking items
///
/// ```rust, ignore
///  let mut installed = lock!(slot.installed);
///  *installed = true;
/// ```
macro_rules! lock {
    ($lock:expr) => {
        $lock
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    };
}

/// Helper macro for reading locked items
///
/// ```rust, ignore
///  let snapshot = read_lock!(self.elements).clone();
/// ```
macro_rules! read_lock {
    ($rwlock:expr) => {
        $rwlock
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    };
}

/// Helper macro for writing to locked items
///
/// ```rust, ignore
///  let mut elements = write_lock!(self.elements);
///  *elements = updated.into();
/// ```
macro_rules! write_lock {
    ($rwlock:expr) => {
        $rwlock
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    };
}
