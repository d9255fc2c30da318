/// Work deferred to the next frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameTask {
    RecomputeActiveCue,
    RestoreCaption,
}

/// Coalesces bursts of notifications into at most one run per task per frame.
#[derive(Debug, Default)]
pub struct FrameScheduler {
    queued: Vec<FrameTask>,
}

impl FrameScheduler {
    /// Returns `false` when the task was already waiting for the next frame.
    pub fn schedule(&mut self, task: FrameTask) -> bool {
        if self.queued.contains(&task) {
            return false;
        }
        self.queued.push(task);
        true
    }

    pub fn is_scheduled(&self, task: FrameTask) -> bool {
        self.queued.contains(&task)
    }

    /// Hands out everything queued so far. Tasks scheduled while the returned
    /// batch runs land in the following frame.
    pub fn take_due(&mut self) -> Vec<FrameTask> {
        std::mem::take(&mut self.queued)
    }

    pub fn clear(&mut self) {
        self.queued.clear();
    }
}
