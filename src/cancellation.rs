use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

/// Shared shutdown flag. The Ctrl-C handler cancels it; the accept loop and
/// the headless reader poll it.
#[derive(Clone, Debug, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}
