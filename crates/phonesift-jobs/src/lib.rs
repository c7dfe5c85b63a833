pub mod count;
pub mod detect;
pub mod error;
pub mod events;
pub mod export;
pub mod linker;
pub mod queue;
pub mod task;
pub mod worker;

pub use error::{JobError, Result};
pub use queue::{JobContext, StoreQueue, TaskQueue};
pub use task::{JobOutcome, Task};
pub use worker::{JobResult, ProcessedJob, Worker, WorkerOptions};
