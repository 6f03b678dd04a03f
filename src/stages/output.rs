//! Terminal stage of every workflow

use async_trait::async_trait;

use crate::pipeline::{Stage, StageId, StateRecord, TaskStatus};
use crate::Result;

/// Terminal stage: hands the state back and settles the task status
pub struct OutputStage;

#[async_trait]
impl Stage for OutputStage {
    fn id(&self) -> StageId {
        StageId::Output
    }

    async fn apply(&self, mut state: StateRecord) -> Result<StateRecord> {
        if state.task_status == TaskStatus::InProgress {
            state.task_status = TaskStatus::Done;
        }
        Ok(state)
    }
}
