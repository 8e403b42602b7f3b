use std::collections::BTreeMap;

use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use tern_core::ChatMessage;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentRecord {
    pub id: String,
    pub name: String,
    pub status: String,
    #[serde(default)]
    pub metadata: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepRecord {
    pub name: String,
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowRecord {
    pub id: String,
    pub name: String,
    pub status: String,
    #[serde(default)]
    pub steps: Vec<StepRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogRecord {
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
    pub level: String,
    pub message: String,
    #[serde(default)]
    pub source: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FeedUpdate {
    Agent(AgentRecord),
    AgentRemoved(String),
    Workflow(WorkflowRecord),
    WorkflowRemoved(String),
    Log(LogRecord),
    Message(ChatMessage),
    Loading(bool),
    Error(String),
}

pub trait AgentSource: Send {
    fn poll_agents(&mut self) -> Vec<FeedUpdate>;
}

pub trait WorkflowSource: Send {
    fn poll_workflows(&mut self) -> Vec<FeedUpdate>;
}

pub trait LogRecordSource: Send {
    fn poll_logs(&mut self) -> Vec<LogRecord>;
}
