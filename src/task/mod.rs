mod computation_task;

pub use computation_task::{ComputationTask, TaskState};
