//! Per-frame sequencing of the simulation and render submissions.
//!
//! One frame runs `acquire_image` → `submit_simulation` → `submit_render` →
//! `present`. The simulation waits on the previous frame's `GraphicsDone`
//! and signals `ComputeDone`; the render waits on `ComputeDone` at vertex
//! input and on `ImageAcquired` at color output, then signals
//! `GraphicsDone` and `RenderComplete`. A paused frame skips the simulation
//! and its two edges.

use super::queue::SubmitQueue;
use super::sync::{PipelineStage, QueueRole, Semaphore, SemaphoreLedger, Submission, SyncError, WaitEdge};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FramePhase {
    Idle,
    Acquired,
    Simulated,
    Rendered,
}

#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    #[error("semaphore protocol violated: {0}")]
    Sync(#[from] SyncError),

    #[error("frame step out of order: expected {expected:?}, found {found:?}")]
    OutOfOrder { expected: FramePhase, found: FramePhase },

    #[error("frame submitted before the orchestrator was primed")]
    NotPrimed,
}

pub struct FrameOrchestrator {
    ledger: SemaphoreLedger,
    phase: FramePhase,
    primed: bool,
    /// Requested pause state, latched at the next `acquire_image`.
    pause_requested: bool,
    /// Pause state of the frame in flight.
    paused: bool,
    frame: u64,
}

impl FrameOrchestrator {
    pub fn new(paused: bool) -> Self {
        Self {
            ledger: SemaphoreLedger::new(),
            phase: FramePhase::Idle,
            primed: false,
            pause_requested: paused,
            paused,
            frame: 0,
        }
    }

    /// Signal `GraphicsDone` once with an empty submission so the first
    /// simulation has something to wait on.
    pub fn prime<Q: SubmitQueue>(&mut self, queue: &mut Q) -> Result<(), FrameError> {
        if self.primed {
            return Ok(());
        }
        let submission = Submission {
            label: "prime",
            frame: self.frame,
            role: QueueRole::Graphics,
            waits: Vec::new(),
            signals: vec![Semaphore::GraphicsDone],
        };
        self.ledger.apply(&submission)?;
        queue.submit(&submission, Q::Commands::default());
        self.primed = true;
        Ok(())
    }

    /// Request a pause state. Takes effect from the next frame; a frame
    /// already in flight keeps the semaphore set it started with.
    pub fn set_paused(&mut self, paused: bool) {
        self.pause_requested = paused;
    }

    pub fn pause_requested(&self) -> bool {
        self.pause_requested
    }

    /// Pause state of the current (or, when idle, the next) frame.
    pub fn is_paused(&self) -> bool {
        if self.phase == FramePhase::Idle {
            self.pause_requested
        } else {
            self.paused
        }
    }

    pub fn phase(&self) -> FramePhase {
        self.phase
    }

    pub fn frame_index(&self) -> u64 {
        self.frame
    }

    pub fn ledger(&self) -> &SemaphoreLedger {
        &self.ledger
    }

    /// Start a frame after the surface handed out an image.
    pub fn acquire_image(&mut self) -> Result<(), FrameError> {
        if !self.primed {
            return Err(FrameError::NotPrimed);
        }
        self.expect_phase(FramePhase::Idle)?;
        self.ledger.signal(Semaphore::ImageAcquired)?;
        self.paused = self.pause_requested;
        self.phase = FramePhase::Acquired;
        Ok(())
    }

    pub fn simulation_submission(&self) -> Submission {
        Submission {
            label: "simulate",
            frame: self.frame,
            role: QueueRole::Compute,
            waits: vec![WaitEdge::new(Semaphore::GraphicsDone, PipelineStage::ComputeShader)],
            signals: vec![Semaphore::ComputeDone],
        }
    }

    pub fn render_submission(&self) -> Submission {
        let mut waits = Vec::with_capacity(2);
        let mut signals = Vec::with_capacity(2);
        if !self.paused {
            waits.push(WaitEdge::new(Semaphore::ComputeDone, PipelineStage::VertexInput));
            signals.push(Semaphore::GraphicsDone);
        }
        waits.push(WaitEdge::new(Semaphore::ImageAcquired, PipelineStage::ColorAttachmentOutput));
        signals.push(Semaphore::RenderComplete);
        Submission {
            label: "render",
            frame: self.frame,
            role: QueueRole::Graphics,
            waits,
            signals,
        }
    }

    /// Submit the recorded simulation step. Not allowed on a paused frame.
    pub fn submit_simulation<Q: SubmitQueue>(&mut self, queue: &mut Q, commands: Q::Commands) -> Result<(), FrameError> {
        self.expect_phase(FramePhase::Acquired)?;
        if self.paused {
            return Err(FrameError::OutOfOrder {
                expected: FramePhase::Simulated,
                found: FramePhase::Acquired,
            });
        }
        let submission = self.simulation_submission();
        self.ledger.apply(&submission)?;
        queue.submit(&submission, commands);
        self.phase = FramePhase::Simulated;
        Ok(())
    }

    /// Submit the draw commands for this frame.
    pub fn submit_render<Q: SubmitQueue>(&mut self, queue: &mut Q, commands: Q::Commands) -> Result<(), FrameError> {
        let expected = if self.paused { FramePhase::Acquired } else { FramePhase::Simulated };
        self.expect_phase(expected)?;
        let submission = self.render_submission();
        self.ledger.apply(&submission)?;
        queue.submit(&submission, commands);
        self.phase = FramePhase::Rendered;
        Ok(())
    }

    /// Hand the image to the presentation engine and close the frame.
    pub fn present(&mut self) -> Result<(), FrameError> {
        self.expect_phase(FramePhase::Rendered)?;
        self.ledger.wait(Semaphore::RenderComplete)?;
        self.phase = FramePhase::Idle;
        self.frame += 1;
        Ok(())
    }

    fn expect_phase(&self, expected: FramePhase) -> Result<(), FrameError> {
        if self.phase == expected {
            Ok(())
        } else {
            Err(FrameError::OutOfOrder {
                expected,
                found: self.phase,
            })
        }
    }
}
