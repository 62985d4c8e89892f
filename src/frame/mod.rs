//! Frame orchestration: one simulation step and one render step per frame,
//! ordered by the `ComputeDone`/`GraphicsDone` semaphore pair.

pub mod orchestrator;
pub mod queue;
pub mod sync;

pub use orchestrator::{FrameError, FrameOrchestrator, FramePhase};
pub use queue::{RecordingQueue, SubmitQueue, WgpuSubmitQueue};
pub use sync::{PipelineStage, QueueRole, Semaphore, SemaphoreLedger, Submission, SyncError, WaitEdge};
