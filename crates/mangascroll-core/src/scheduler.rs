//! Frame scheduling seam.
//!
//! The driver asks for one callback per display frame and cancels it
//! synchronously. Browsers back this with `requestAnimationFrame`; the manual
//! scheduler here lets the host (or a test) decide when frames fire.

/// Opaque identifier of a requested frame callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameHandle(u64);

impl FrameHandle {
    pub fn new(id: u64) -> Self {
        FrameHandle(id)
    }

    pub fn id(self) -> u64 {
        self.0
    }
}

pub trait FrameScheduler {
    /// Request a callback on the next display frame.
    fn request_frame(&mut self) -> FrameHandle;

    /// Cancel a pending callback. Cancelling an unknown or already-fired handle is a no-op.
    fn cancel_frame(&mut self, handle: FrameHandle);
}

/// Scheduler driven by explicit `take_due` calls.
#[derive(Debug, Default)]
pub struct ManualFrameScheduler {
    next_id: u64,
    pending: Vec<FrameHandle>,
    requested: usize,
    cancelled: usize,
    max_pending: usize,
}

impl ManualFrameScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drain every callback that would fire on the next frame.
    pub fn take_due(&mut self) -> Vec<FrameHandle> {
        std::mem::take(&mut self.pending)
    }

    pub fn pending(&self) -> &[FrameHandle] {
        &self.pending
    }

    pub fn requested_count(&self) -> usize {
        self.requested
    }

    pub fn cancelled_count(&self) -> usize {
        self.cancelled
    }

    /// Largest number of callbacks that were ever pending at once.
    pub fn max_pending(&self) -> usize {
        self.max_pending
    }
}

impl FrameScheduler for ManualFrameScheduler {
    fn request_frame(&mut self) -> FrameHandle {
        self.next_id = self.next_id.wrapping_add(1);
        let handle = FrameHandle(self.next_id);
        self.pending.push(handle);
        self.requested += 1;
        self.max_pending = self.max_pending.max(self.pending.len());
        handle
    }

    fn cancel_frame(&mut self, handle: FrameHandle) {
        let before = self.pending.len();
        self.pending.retain(|pending| *pending != handle);
        if self.pending.len() != before {
            self.cancelled += 1;
        }
    }
}
