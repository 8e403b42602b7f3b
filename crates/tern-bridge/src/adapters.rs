use chrono::DateTime;
use chrono::Utc;
use serde_json::Value;
use tern_core::AgentDisplay;
use tern_core::AgentStatus;
use tern_core::LogEntry;
use tern_core::LogLevel;
use tern_core::StepStatus;
use tern_core::UiEvent;
use tern_core::WorkflowDisplay;
use tern_core::WorkflowStatus;
use tern_core::WorkflowStepDisplay;

use crate::contracts::AgentRecord;
use crate::contracts::FeedUpdate;
use crate::contracts::LogRecord;
use crate::contracts::WorkflowRecord;

pub fn agent_status(raw: &str) -> AgentStatus {
    match raw.trim().to_ascii_lowercase().as_str() {
        "idle" => AgentStatus::Idle,
        "thinking" => AgentStatus::Thinking,
        "working" | "busy" | "running" => AgentStatus::Working,
        "waiting" | "blocked" => AgentStatus::Waiting,
        "completed" | "done" => AgentStatus::Completed,
        "failed" | "error" => AgentStatus::Failed,
        _ => AgentStatus::Unknown,
    }
}

pub fn workflow_status(raw: &str) -> WorkflowStatus {
    match raw.trim().to_ascii_lowercase().as_str() {
        "pending" | "queued" => WorkflowStatus::Pending,
        "running" | "active" => WorkflowStatus::Running,
        "paused" => WorkflowStatus::Paused,
        "completed" | "done" => WorkflowStatus::Completed,
        "failed" | "error" => WorkflowStatus::Failed,
        "cancelled" | "canceled" => WorkflowStatus::Cancelled,
        _ => WorkflowStatus::Unknown,
    }
}

pub fn step_status(raw: &str) -> StepStatus {
    match raw.trim().to_ascii_lowercase().as_str() {
        "pending" => StepStatus::Pending,
        "running" | "in_progress" => StepStatus::Running,
        "done" | "completed" => StepStatus::Done,
        "failed" | "error" => StepStatus::Failed,
        "skipped" => StepStatus::Skipped,
        _ => StepStatus::Unknown,
    }
}

pub fn log_level(raw: &str) -> LogLevel {
    match raw.trim().to_ascii_lowercase().as_str() {
        "trace" => LogLevel::Trace,
        "debug" => LogLevel::Debug,
        "info" => LogLevel::Info,
        "warn" | "warning" => LogLevel::Warn,
        "error" | "fatal" => LogLevel::Error,
        _ => LogLevel::Unknown,
    }
}

pub fn agent_display(record: &AgentRecord) -> AgentDisplay {
    let metadata = record
        .metadata
        .iter()
        .map(|(key, value)| {
            let text = match value {
                Value::String(text) => text.clone(),
                other => other.to_string(),
            };
            (key.clone(), text)
        })
        .collect();
    AgentDisplay {
        id: record.id.clone(),
        name: record.name.clone(),
        status: agent_status(&record.status),
        metadata,
    }
}

pub fn workflow_display(record: &WorkflowRecord) -> WorkflowDisplay {
    WorkflowDisplay {
        id: record.id.clone(),
        name: record.name.clone(),
        status: workflow_status(&record.status),
        steps: record
            .steps
            .iter()
            .map(|step| WorkflowStepDisplay {
                name: step.name.clone(),
                status: step_status(&step.status),
            })
            .collect(),
    }
}

pub fn log_entry(record: &LogRecord, received_at: DateTime<Utc>) -> LogEntry {
    LogEntry {
        timestamp: record.timestamp.unwrap_or(received_at),
        level: log_level(&record.level),
        message: record.message.clone(),
        source: record.source.clone(),
    }
}

/// Bus event for an update. Transcript messages and loading changes are not
/// bus events and yield `None`.
pub fn event_for(update: &FeedUpdate, received_at: DateTime<Utc>) -> Option<UiEvent> {
    let event = match update {
        FeedUpdate::Agent(record) => UiEvent::AgentUpdated(agent_display(record)),
        FeedUpdate::AgentRemoved(id) => UiEvent::AgentRemoved(id.clone()),
        FeedUpdate::Workflow(record) => UiEvent::WorkflowUpdated(workflow_display(record)),
        FeedUpdate::WorkflowRemoved(id) => UiEvent::WorkflowRemoved(id.clone()),
        FeedUpdate::Log(record) => UiEvent::LogAppended(log_entry(record, received_at)),
        FeedUpdate::Error(message) => UiEvent::ErrorRaised(message.clone()),
        FeedUpdate::Message(_) | FeedUpdate::Loading(_) => return None,
    };
    Some(event)
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;
    use crate::contracts::StepRecord;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn known_statuses_map_and_unknown_falls_back() {
        assert_eq!(agent_status("Thinking"), AgentStatus::Thinking);
        assert_eq!(agent_status(" busy "), AgentStatus::Working);
        assert_eq!(agent_status("hibernating"), AgentStatus::Unknown);
        assert_eq!(workflow_status("CANCELED"), WorkflowStatus::Cancelled);
        assert_eq!(workflow_status(""), WorkflowStatus::Unknown);
        assert_eq!(step_status("in_progress"), StepStatus::Running);
        assert_eq!(step_status("retrying"), StepStatus::Unknown);
        assert_eq!(log_level("WARNING"), LogLevel::Warn);
        assert_eq!(log_level("notice"), LogLevel::Unknown);
    }

    #[test]
    fn agent_metadata_is_flattened_to_text() {
        let record: AgentRecord = serde_json::from_value(json!({
            "id": "a1",
            "name": "planner",
            "status": "idle",
            "metadata": {"model": "local-7b", "tokens": 512, "tools": ["grep"]}
        }))
        .expect("decode");

        let display = agent_display(&record);
        assert_eq!(display.status, AgentStatus::Idle);
        assert_eq!(display.metadata["model"], "local-7b");
        assert_eq!(display.metadata["tokens"], "512");
        assert_eq!(display.metadata["tools"], "[\"grep\"]");
    }

    #[test]
    fn workflow_steps_keep_order() {
        let record = WorkflowRecord {
            id: "w1".into(),
            name: "release".into(),
            status: "running".into(),
            steps: vec![
                StepRecord {
                    name: "build".into(),
                    status: "done".into(),
                },
                StepRecord {
                    name: "publish".into(),
                    status: "waiting-for-approval".into(),
                },
            ],
        };
        let display = workflow_display(&record);
        let statuses: Vec<StepStatus> = display.steps.iter().map(|s| s.status).collect();
        assert_eq!(statuses, vec![StepStatus::Done, StepStatus::Unknown]);
        assert_eq!(display.completed_steps(), 1);
    }

    #[test]
    fn log_entry_uses_receive_time_when_missing() {
        let record = LogRecord {
            timestamp: None,
            level: "info".into(),
            message: "connected".into(),
            source: Some("agent-manager".into()),
        };
        let entry = log_entry(&record, now());
        assert_eq!(entry.timestamp, now());
        assert_eq!(entry.level, LogLevel::Info);
    }

    #[test]
    fn transcript_updates_are_not_bus_events() {
        assert_eq!(event_for(&FeedUpdate::Loading(true), now()), None);
        assert_eq!(
            event_for(&FeedUpdate::AgentRemoved("a1".into()), now()),
            Some(UiEvent::AgentRemoved("a1".into()))
        );
    }
}
