use serde::Deserialize;
use serde::Serialize;

use super::state::AgentDisplay;
use super::state::LogEntry;
use super::state::ViewType;
use super::state::WorkflowDisplay;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum UiAction {
    SetView {
        view: ViewType,
    },
    UpsertAgent {
        agent: AgentDisplay,
    },
    RemoveAgent {
        id: String,
    },
    UpsertWorkflow {
        workflow: WorkflowDisplay,
    },
    RemoveWorkflow {
        id: String,
    },
    AppendLog {
        entry: LogEntry,
    },
    ClearLogs,
    SelectAgent {
        #[serde(default)]
        id: Option<String>,
    },
    SelectWorkflow {
        #[serde(default)]
        id: Option<String>,
    },
    SetLoading {
        loading: bool,
    },
    SetError {
        message: String,
    },
    ClearError,
    #[serde(other)]
    Unknown,
}

impl UiAction {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::SetView { .. } => "set_view",
            Self::UpsertAgent { .. } => "upsert_agent",
            Self::RemoveAgent { .. } => "remove_agent",
            Self::UpsertWorkflow { .. } => "upsert_workflow",
            Self::RemoveWorkflow { .. } => "remove_workflow",
            Self::AppendLog { .. } => "append_log",
            Self::ClearLogs => "clear_logs",
            Self::SelectAgent { .. } => "select_agent",
            Self::SelectWorkflow { .. } => "select_workflow",
            Self::SetLoading { .. } => "set_loading",
            Self::SetError { .. } => "set_error",
            Self::ClearError => "clear_error",
            Self::Unknown => "unknown",
        }
    }
}
