use std::collections::BTreeMap;

use chrono::DateTime;
use chrono::TimeZone;
use chrono::Utc;
use pretty_assertions::assert_eq;

pub(super) use super::reduce;
pub(super) use crate::actions::UiAction;
pub(super) use crate::state::AgentDisplay;
pub(super) use crate::state::AgentStatus;
pub(super) use crate::state::LogEntry;
pub(super) use crate::state::LogLevel;
pub(super) use crate::state::StepStatus;
pub(super) use crate::state::UiState;
pub(super) use crate::state::ViewType;
pub(super) use crate::state::WorkflowDisplay;
pub(super) use crate::state::WorkflowStatus;
pub(super) use crate::state::WorkflowStepDisplay;

mod invariants;
mod logs;
mod selection_reconcile;

fn state() -> UiState {
    UiState::new()
}

fn agent(id: &str, status: AgentStatus) -> AgentDisplay {
    AgentDisplay {
        id: id.to_string(),
        name: format!("agent {id}"),
        status,
        metadata: BTreeMap::new(),
    }
}

fn workflow(id: &str, status: WorkflowStatus, steps: &[(&str, StepStatus)]) -> WorkflowDisplay {
    WorkflowDisplay {
        id: id.to_string(),
        name: format!("workflow {id}"),
        status,
        steps: steps
            .iter()
            .map(|(name, status)| WorkflowStepDisplay {
                name: name.to_string(),
                status: *status,
            })
            .collect(),
    }
}

fn log(message: &str, level: LogLevel, secs: i64) -> LogEntry {
    LogEntry {
        timestamp: at(secs),
        level,
        message: message.to_string(),
        source: None,
    }
}

fn at(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(1_700_000_000 + secs, 0)
        .single()
        .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
}

fn run_all(initial: &UiState, actions: &[UiAction]) -> UiState {
    actions
        .iter()
        .fold(initial.clone(), |state, action| reduce(&state, action))
}

fn assert_unchanged(before: &UiState, action: UiAction) {
    let after = reduce(before, &action);
    assert_eq!(&after, before, "{} should be a no-op", action.kind());
}
