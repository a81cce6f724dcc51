use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

/// Single point of mutual exclusion over the LED matrix.
///
/// Every producer other than the idle clock face must hold a [`DisplayGuard`]
/// while it draws. The clock face only draws when [`DisplayArbiter::is_owned`]
/// is false.
#[derive(Debug, Clone, Default)]
pub struct DisplayArbiter {
    owned: Arc<AtomicBool>,
}

impl DisplayArbiter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn try_acquire(&self) -> Option<DisplayGuard> {
        self.owned
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| DisplayGuard {
                owned: Arc::clone(&self.owned),
            })
    }

    pub fn is_owned(&self) -> bool {
        self.owned.load(Ordering::Acquire)
    }
}

#[derive(Debug)]
#[must_use = "display ownership is released as soon as the guard is dropped"]
pub struct DisplayGuard {
    owned: Arc<AtomicBool>,
}

impl Drop for DisplayGuard {
    fn drop(&mut self) {
        self.owned.store(false, Ordering::Release);
    }
}
