//! Where validated submissions go.

use super::sync::Submission;

pub trait SubmitQueue {
    /// Recorded work carried by one submission.
    type Commands: Default;

    fn submit(&mut self, submission: &Submission, commands: Self::Commands);
}

/// Submits to the device queue in call order.
///
/// The single wgpu queue executes submissions in order, which satisfies
/// every wait edge the ledger has approved. Buffer hazards between the
/// compute and render submissions are tracked by wgpu itself.
pub struct WgpuSubmitQueue<'a> {
    queue: &'a wgpu::Queue,
    last: Option<wgpu::SubmissionIndex>,
}

impl<'a> WgpuSubmitQueue<'a> {
    pub fn new(queue: &'a wgpu::Queue) -> Self {
        Self { queue, last: None }
    }

    /// Index of the most recent submission, for callers that need to poll.
    pub fn last_submission(&self) -> Option<&wgpu::SubmissionIndex> {
        self.last.as_ref()
    }
}

impl SubmitQueue for WgpuSubmitQueue<'_> {
    type Commands = Vec<wgpu::CommandBuffer>;

    fn submit(&mut self, submission: &Submission, commands: Self::Commands) {
        log::trace!(
            "frame {} submit '{}' ({:?}, {} buffers): waits {:?}, signals {:?}",
            submission.frame,
            submission.label,
            submission.role,
            commands.len(),
            submission.waits,
            submission.signals
        );
        self.last = Some(self.queue.submit(commands));
    }
}

/// Keeps every submission for later inspection.
#[derive(Debug, Default)]
pub struct RecordingQueue {
    pub submissions: Vec<Submission>,
}

impl RecordingQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn labels(&self) -> Vec<&'static str> {
        self.submissions.iter().map(|s| s.label).collect()
    }

    /// Position of the last submission before `before` that signals `semaphore`.
    pub fn last_signal_before(&self, before: usize, semaphore: super::sync::Semaphore) -> Option<usize> {
        self.submissions[..before.min(self.submissions.len())]
            .iter()
            .rposition(|s| s.signals(semaphore))
    }
}

impl SubmitQueue for RecordingQueue {
    type Commands = ();

    fn submit(&mut self, submission: &Submission, _commands: ()) {
        self.submissions.push(submission.clone());
    }
}
