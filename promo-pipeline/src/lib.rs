pub mod batch;
pub mod orchestrator;
pub mod report;
pub mod publisher;
pub mod runner;

pub use batch::{BatchScheduler, SlotBoard};
pub use orchestrator::{PipelineOrchestrator, SchedulingDecision};
pub use publisher::{DraftPublisher, PublishSummary};
pub use report::{RunClock, RunReport};
pub use runner::{PipelineRunner, RunOutcome, RunnerSettings};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScheduleError {
    #[error("No batch slot available for today")]
    NoBatchAvailable,
}
