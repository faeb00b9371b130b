/// Identifies one requested frame so it can be cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FrameToken(pub u64);

/// Host-side source of frame callbacks, typically tied to display refresh.
///
/// The render loop requests one frame at a time and never blocks waiting
/// for it; the host calls back into the loop when the frame is due.
pub trait FrameScheduler {
    fn request_frame(&mut self) -> FrameToken;

    /// Withdraw a request. Unknown or already-fired tokens are ignored.
    fn cancel_frame(&mut self, token: FrameToken);
}

/// Scheduler driven by hand: tests and the headless CLI fire frames
/// explicitly.
#[derive(Debug, Default)]
pub struct ManualScheduler {
    next: u64,
    pending: Option<FrameToken>,
    requested: u64,
    cancelled: u64,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// The outstanding request, if any, consumed as if the frame fired.
    pub fn fire(&mut self) -> Option<FrameToken> {
        self.pending.take()
    }

    pub fn pending(&self) -> Option<FrameToken> {
        self.pending
    }

    pub fn requested(&self) -> u64 {
        self.requested
    }

    pub fn cancelled(&self) -> u64 {
        self.cancelled
    }
}

impl FrameScheduler for ManualScheduler {
    fn request_frame(&mut self) -> FrameToken {
        self.next += 1;
        self.requested += 1;
        let token = FrameToken(self.next);
        self.pending = Some(token);
        token
    }

    fn cancel_frame(&mut self, token: FrameToken) {
        if self.pending == Some(token) {
            self.pending = None;
            self.cancelled += 1;
        }
    }
}
