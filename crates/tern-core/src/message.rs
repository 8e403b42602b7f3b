use serde::Deserialize;
use serde::Deserializer;
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextStyle {
    Error,
    Success,
    Warning,
    Muted,
    Bold,
    Italic,
    #[default]
    #[serde(other)]
    Default,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextBlock {
    pub content: String,
    #[serde(default)]
    pub style: TextStyle,
    #[serde(default)]
    pub icon: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TodoStatus {
    Completed,
    InProgress,
    #[serde(other)]
    Pending,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoItem {
    pub description: String,
    pub status: TodoStatus,
    #[serde(default)]
    pub result: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoListBlock {
    pub items: Vec<TodoItem>,
    #[serde(default)]
    pub current_index: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionItem {
    pub id: String,
    pub description: String,
    pub command: String,
    #[serde(default)]
    pub parameters: Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    Shell,
    File,
    Other,
}

impl CommandKind {
    pub fn classify(command: &str) -> Self {
        match command {
            "run_command" | "execute_command" | "shell" | "bash" | "exec" => Self::Shell,
            "read_file" | "write_file" | "edit_file" | "create_file" | "delete_file"
            | "list_directory" => Self::File,
            _ => Self::Other,
        }
    }
}

impl ActionItem {
    pub fn command_kind(&self) -> CommandKind {
        CommandKind::classify(&self.command)
    }

    pub fn target(&self) -> Option<&str> {
        let key = match self.command_kind() {
            CommandKind::Shell => "command",
            CommandKind::File => "path",
            CommandKind::Other => return None,
        };
        self.parameters.get(key).and_then(Value::as_str)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionListBlock {
    pub actions: Vec<ActionItem>,
    #[serde(default)]
    pub show_commands: Option<bool>,
    #[serde(default)]
    pub show_parameters: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub success: bool,
    pub message: String,
    #[serde(default)]
    pub output: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultsBlock {
    pub results: Vec<ExecutionResult>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffBlock {
    #[serde(default)]
    pub file_path: Option<String>,
    #[serde(default)]
    pub deletions: Vec<String>,
    #[serde(default)]
    pub additions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeBlock {
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
    pub content: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DividerStyle {
    Dot,
    #[default]
    #[serde(other)]
    Rule,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DividerBlock {
    #[serde(default)]
    pub style: DividerStyle,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListBlock {
    pub items: Vec<String>,
    #[serde(default)]
    pub ordered: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableBlock {
    #[serde(default)]
    pub headers: Vec<String>,
    #[serde(default)]
    pub rows: Vec<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    Text(TextBlock),
    TodoList(TodoListBlock),
    ActionList(ActionListBlock),
    Results(ResultsBlock),
    Diff(DiffBlock),
    Code(CodeBlock),
    Divider(DividerBlock),
    List(ListBlock),
    Table(TableBlock),
    #[serde(skip_deserializing)]
    Unsupported { kind: String },
}

impl ContentBlock {
    pub fn text(content: impl Into<String>) -> Self {
        Self::Text(TextBlock {
            content: content.into(),
            style: TextStyle::Default,
            icon: None,
        })
    }

    pub fn styled(content: impl Into<String>, style: TextStyle) -> Self {
        Self::Text(TextBlock {
            content: content.into(),
            style,
            icon: None,
        })
    }

    pub fn type_name(&self) -> &str {
        match self {
            Self::Text(_) => "text",
            Self::TodoList(_) => "todo_list",
            Self::ActionList(_) => "action_list",
            Self::Results(_) => "results",
            Self::Diff(_) => "diff",
            Self::Code(_) => "code",
            Self::Divider(_) => "divider",
            Self::List(_) => "list",
            Self::Table(_) => "table",
            Self::Unsupported { kind } => kind,
        }
    }

    pub fn from_value(value: Value) -> Self {
        let kind = value
            .get("type")
            .and_then(Value::as_str)
            .unwrap_or("<missing>")
            .to_string();
        serde_json::from_value(value).unwrap_or(Self::Unsupported { kind })
    }
}

pub fn deserialize_blocks_lenient<'de, D>(deserializer: D) -> Result<Vec<ContentBlock>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Vec::<Value>::deserialize(deserializer)?;
    Ok(raw.into_iter().map(ContentBlock::from_value).collect())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    User,
    Assistant,
    System,
    Tool,
    Error,
    Confirmation,
}

impl MessageKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::User => "You",
            Self::Assistant => "Assistant",
            Self::System => "System",
            Self::Tool => "Tool",
            Self::Error => "Error",
            Self::Confirmation => "Confirm",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfirmationStatus {
    Pending,
    Accepted,
    Declined,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmationDecision {
    Accept,
    Decline,
}

impl ConfirmationDecision {
    pub fn resulting_status(self) -> ConfirmationStatus {
        match self {
            Self::Accept => ConfirmationStatus::Accepted,
            Self::Decline => ConfirmationStatus::Declined,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: MessageKind,
    #[serde(default, deserialize_with = "deserialize_blocks_lenient")]
    pub blocks: Vec<ContentBlock>,
    #[serde(default)]
    pub confirmation_id: Option<String>,
    #[serde(default)]
    pub status: Option<ConfirmationStatus>,
}

impl ChatMessage {
    pub fn new(id: impl Into<String>, kind: MessageKind, blocks: Vec<ContentBlock>) -> Self {
        Self {
            id: id.into(),
            kind,
            blocks,
            confirmation_id: None,
            status: None,
        }
    }

    pub fn confirmation(
        id: impl Into<String>,
        confirmation_id: impl Into<String>,
        blocks: Vec<ContentBlock>,
    ) -> Self {
        Self {
            id: id.into(),
            kind: MessageKind::Confirmation,
            blocks,
            confirmation_id: Some(confirmation_id.into()),
            status: Some(ConfirmationStatus::Pending),
        }
    }

    pub fn is_pending_confirmation(&self) -> bool {
        self.kind == MessageKind::Confirmation && self.status == Some(ConfirmationStatus::Pending)
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("no confirmation with id {0}")]
    UnknownConfirmation(String),
    #[error("confirmation {0} was already resolved")]
    AlreadyResolved(String),
}

pub trait MessageStore {
    fn messages(&self) -> &[ChatMessage];

    fn resolve_confirmation(
        &mut self,
        confirmation_id: &str,
        decision: ConfirmationDecision,
    ) -> Result<(), StoreError>;
}

#[derive(Debug, Clone, Default)]
pub struct Transcript {
    messages: Vec<ChatMessage>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, message: ChatMessage) {
        self.messages.push(message);
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

impl MessageStore for Transcript {
    fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    fn resolve_confirmation(
        &mut self,
        confirmation_id: &str,
        decision: ConfirmationDecision,
    ) -> Result<(), StoreError> {
        let message = self
            .messages
            .iter_mut()
            .rev()
            .find(|m| m.confirmation_id.as_deref() == Some(confirmation_id))
            .ok_or_else(|| StoreError::UnknownConfirmation(confirmation_id.to_string()))?;
        if message.status != Some(ConfirmationStatus::Pending) {
            return Err(StoreError::AlreadyResolved(confirmation_id.to_string()));
        }
        message.status = Some(decision.resulting_status());
        Ok(())
    }
}
