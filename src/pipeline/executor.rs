//! Pipeline execution

use chrono::Utc;
use tracing::{debug, error, info, info_span, Instrument};

use super::definition::PipelineDefinition;
use super::error::PipelineError;
use super::stage::StageId;
use super::state::{Message, StageOutcome, StageTrace, StateRecord};

impl PipelineDefinition {
    /// Run the stages in order until the terminal stage has run
    ///
    /// A stage that degrades does not stop the run. A stage that returns an
    /// error does: the error carries the state as it was when that stage was
    /// entered, and no later stage runs.
    pub async fn run(&self, state: StateRecord) -> Result<StateRecord, PipelineError> {
        let span = info_span!("pipeline", run_id = %state.run_id, kind = %self.kind);
        self.run_stages(state).instrument(span).await
    }

    async fn run_stages(&self, mut state: StateRecord) -> Result<StateRecord, PipelineError> {
        info!("Starting {} pipeline", self.kind);

        for stage in &self.stages {
            let id = stage.id();
            let entry = state.clone();
            let trace_len = state.trace.len();
            let started_at = Utc::now();

            debug!("Entering stage {}", id);
            state = match stage.apply(state).await {
                Ok(next) => next,
                Err(e) => {
                    error!("Stage {} failed: {}", id, e);
                    return Err(PipelineError::Stage {
                        stage: id,
                        cause: Box::new(e),
                        state: Box::new(entry),
                    });
                }
            };

            check_history(id, &entry.messages, &state.messages)?;
            record_trace(&mut state, id, trace_len, started_at);

            if id == self.terminal {
                break;
            }
        }

        info!("{}", state.summary());
        Ok(state)
    }
}

/// Stages may only append to the conversation
fn check_history(stage: StageId, before: &[Message], after: &[Message]) -> Result<(), PipelineError> {
    if after.len() < before.len() || after[..before.len()] != *before {
        return Err(PipelineError::HistoryRewritten { stage });
    }
    Ok(())
}

fn record_trace(
    state: &mut StateRecord,
    stage: StageId,
    trace_len: usize,
    started_at: chrono::DateTime<Utc>,
) {
    let degraded = state
        .trace
        .get_mut(trace_len..)
        .and_then(|new| {
            new.iter_mut()
                .find(|t| t.stage == stage && t.outcome == StageOutcome::Degraded)
        });

    match degraded {
        Some(entry) => {
            entry.started_at = started_at;
            entry.completed_at = Utc::now();
        }
        None => state.trace.push(StageTrace {
            stage,
            outcome: StageOutcome::Completed,
            started_at,
            completed_at: Utc::now(),
            note: None,
        }),
    }
}
