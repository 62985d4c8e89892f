//! Binary semaphore bookkeeping for the compute/graphics handoff.
//!
//! wgpu runs every submission on one in-order queue and has no user-visible
//! semaphores, so the protocol is kept as a ledger. Each [`Submission`]
//! states what it waits on and what it signals. The ledger checks that every
//! wait consumes exactly one pending signal and that no semaphore is
//! signaled twice without a wait in between.

use std::fmt;

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Semaphore {
    /// Compute step finished writing the strand buffers.
    ComputeDone,
    /// Render step finished reading the strand buffers.
    GraphicsDone,
    /// Swapchain image is ready to be drawn into.
    ImageAcquired,
    /// Drawing finished, image can be presented.
    RenderComplete,
}

impl Semaphore {
    pub const ALL: [Semaphore; 4] = [
        Semaphore::ComputeDone,
        Semaphore::GraphicsDone,
        Semaphore::ImageAcquired,
        Semaphore::RenderComplete,
    ];

    fn index(self) -> usize {
        match self {
            Semaphore::ComputeDone => 0,
            Semaphore::GraphicsDone => 1,
            Semaphore::ImageAcquired => 2,
            Semaphore::RenderComplete => 3,
        }
    }
}

impl fmt::Display for Semaphore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Stage at which a submission first needs the awaited work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    ComputeShader,
    VertexInput,
    ColorAttachmentOutput,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueRole {
    Compute,
    Graphics,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitEdge {
    pub semaphore: Semaphore,
    pub stage: PipelineStage,
}

impl WaitEdge {
    pub fn new(semaphore: Semaphore, stage: PipelineStage) -> Self {
        Self { semaphore, stage }
    }
}

/// One queue submission and its synchronization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub label: &'static str,
    pub frame: u64,
    pub role: QueueRole,
    pub waits: Vec<WaitEdge>,
    pub signals: Vec<Semaphore>,
}

impl Submission {
    pub fn waits_on(&self, semaphore: Semaphore) -> bool {
        self.waits.iter().any(|w| w.semaphore == semaphore)
    }

    pub fn signals(&self, semaphore: Semaphore) -> bool {
        self.signals.contains(&semaphore)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SyncError {
    #[error("{0} signaled while a previous signal is still pending")]
    DoubleSignal(Semaphore),

    #[error("wait on {0} with no pending signal")]
    WaitWithoutSignal(Semaphore),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SemaphoreLedger {
    pending: [bool; 4],
}

impl SemaphoreLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_pending(&self, semaphore: Semaphore) -> bool {
        self.pending[semaphore.index()]
    }

    /// Semaphores currently carrying an unconsumed signal.
    pub fn pending(&self) -> Vec<Semaphore> {
        Semaphore::ALL.into_iter().filter(|s| self.is_pending(*s)).collect()
    }

    pub fn signal(&mut self, semaphore: Semaphore) -> Result<(), SyncError> {
        let slot = &mut self.pending[semaphore.index()];
        if *slot {
            return Err(SyncError::DoubleSignal(semaphore));
        }
        *slot = true;
        Ok(())
    }

    pub fn wait(&mut self, semaphore: Semaphore) -> Result<(), SyncError> {
        let slot = &mut self.pending[semaphore.index()];
        if !*slot {
            return Err(SyncError::WaitWithoutSignal(semaphore));
        }
        *slot = false;
        Ok(())
    }

    /// Consume the submission's waits, then raise its signals.
    ///
    /// All or nothing: on error the ledger is left untouched.
    pub fn apply(&mut self, submission: &Submission) -> Result<(), SyncError> {
        let mut next = self.clone();
        for edge in &submission.waits {
            next.wait(edge.semaphore)?;
        }
        for semaphore in &submission.signals {
            next.signal(*semaphore)?;
        }
        *self = next;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn submission(waits: Vec<WaitEdge>, signals: Vec<Semaphore>) -> Submission {
        Submission {
            label: "test",
            frame: 0,
            role: QueueRole::Graphics,
            waits,
            signals,
        }
    }

    #[test]
    fn test_double_signal_rejected() {
        let mut ledger = SemaphoreLedger::new();
        ledger.signal(Semaphore::ComputeDone).unwrap();
        assert_eq!(
            ledger.signal(Semaphore::ComputeDone),
            Err(SyncError::DoubleSignal(Semaphore::ComputeDone))
        );
    }

    #[test]
    fn test_wait_consumes_signal() {
        let mut ledger = SemaphoreLedger::new();
        assert_eq!(
            ledger.wait(Semaphore::GraphicsDone),
            Err(SyncError::WaitWithoutSignal(Semaphore::GraphicsDone))
        );
        ledger.signal(Semaphore::GraphicsDone).unwrap();
        ledger.wait(Semaphore::GraphicsDone).unwrap();
        assert!(ledger.pending().is_empty());
    }

    #[test]
    fn test_failed_apply_leaves_ledger_untouched() {
        let mut ledger = SemaphoreLedger::new();
        ledger.signal(Semaphore::ImageAcquired).unwrap();
        let before = ledger.clone();

        // First wait succeeds, second has nothing to consume.
        let bad = submission(
            vec![
                WaitEdge::new(Semaphore::ImageAcquired, PipelineStage::ColorAttachmentOutput),
                WaitEdge::new(Semaphore::ComputeDone, PipelineStage::VertexInput),
            ],
            vec![Semaphore::RenderComplete],
        );
        assert!(ledger.apply(&bad).is_err());
        assert_eq!(ledger, before);
    }

    #[test]
    fn test_a_submission_may_wait_and_resignal_the_same_semaphore() {
        let mut ledger = SemaphoreLedger::new();
        ledger.signal(Semaphore::GraphicsDone).unwrap();
        let cycle = submission(
            vec![WaitEdge::new(Semaphore::GraphicsDone, PipelineStage::ComputeShader)],
            vec![Semaphore::GraphicsDone],
        );
        ledger.apply(&cycle).unwrap();
        assert_eq!(ledger.pending(), vec![Semaphore::GraphicsDone]);
    }
}
