use std::collections::BTreeMap;

use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewType {
    Dashboard,
    #[default]
    Chat,
    Logs,
}

impl ViewType {
    pub const ALL: [ViewType; 3] = [Self::Dashboard, Self::Chat, Self::Logs];

    pub fn next(self) -> Self {
        match self {
            Self::Dashboard => Self::Chat,
            Self::Chat => Self::Logs,
            Self::Logs => Self::Dashboard,
        }
    }

    pub fn prev(self) -> Self {
        match self {
            Self::Dashboard => Self::Logs,
            Self::Chat => Self::Dashboard,
            Self::Logs => Self::Chat,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Dashboard => "Dashboard",
            Self::Chat => "Chat",
            Self::Logs => "Logs",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentStatus {
    Idle,
    Thinking,
    Working,
    Waiting,
    Completed,
    Failed,
    #[serde(other)]
    Unknown,
}

impl AgentStatus {
    pub fn label(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Thinking => "thinking",
            Self::Working => "working",
            Self::Waiting => "waiting",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Unknown => "unknown",
        }
    }

    pub fn is_active(self) -> bool {
        matches!(self, Self::Thinking | Self::Working)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentDisplay {
    pub id: String,
    pub name: String,
    pub status: AgentStatus,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStatus {
    Pending,
    Running,
    Paused,
    Completed,
    Failed,
    Cancelled,
    #[serde(other)]
    Unknown,
}

impl WorkflowStatus {
    pub fn label(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Paused => "paused",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
            Self::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Pending,
    Running,
    Done,
    Failed,
    Skipped,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowStepDisplay {
    pub name: String,
    pub status: StepStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowDisplay {
    pub id: String,
    pub name: String,
    pub status: WorkflowStatus,
    #[serde(default)]
    pub steps: Vec<WorkflowStepDisplay>,
}

impl WorkflowDisplay {
    pub fn completed_steps(&self) -> usize {
        self.steps
            .iter()
            .filter(|step| step.status == StepStatus::Done)
            .count()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
    #[serde(other)]
    Unknown,
}

impl LogLevel {
    pub fn label(self) -> &'static str {
        match self {
            Self::Trace => "TRACE",
            Self::Debug => "DEBUG",
            Self::Info => "INFO",
            Self::Warn => "WARN",
            Self::Error => "ERROR",
            Self::Unknown => "?",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub level: LogLevel,
    pub message: String,
    #[serde(default)]
    pub source: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UiState {
    pub current_view: ViewType,
    pub agents: BTreeMap<String, AgentDisplay>,
    pub workflows: BTreeMap<String, WorkflowDisplay>,
    pub logs: Vec<LogEntry>,
    pub selected_agent_id: Option<String>,
    pub selected_workflow_id: Option<String>,
    pub is_loading: bool,
    pub error: Option<String>,
}

impl UiState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selected_agent(&self) -> Option<&AgentDisplay> {
        self.selected_agent_id
            .as_ref()
            .and_then(|id| self.agents.get(id))
    }

    pub fn selected_workflow(&self) -> Option<&WorkflowDisplay> {
        self.selected_workflow_id
            .as_ref()
            .and_then(|id| self.workflows.get(id))
    }

    pub fn active_agent_count(&self) -> usize {
        self.agents
            .values()
            .filter(|agent| agent.status.is_active())
            .count()
    }

    pub fn log_tail(&self, max: usize) -> &[LogEntry] {
        let start = self.logs.len().saturating_sub(max);
        &self.logs[start..]
    }
}

pub fn neighbour_key<'a>(
    keys: impl DoubleEndedIterator<Item = &'a String>,
    current: Option<&str>,
    forward: bool,
) -> Option<String> {
    let ordered: Vec<&String> = if forward {
        keys.collect()
    } else {
        keys.rev().collect()
    };
    let first = ordered.first()?;
    let Some(current) = current else {
        return Some((*first).clone());
    };
    match ordered.iter().position(|key| key.as_str() == current) {
        Some(idx) => Some(ordered[(idx + 1) % ordered.len()].clone()),
        None => Some((*first).clone()),
    }
}
