use std::collections::VecDeque;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::thread;
use std::thread::JoinHandle;
use std::time::Duration;

use serde_json::json;
use tern_core::ActionItem;
use tern_core::ActionListBlock;
use tern_core::ChatMessage;
use tern_core::CodeBlock;
use tern_core::ContentBlock;
use tern_core::DiffBlock;
use tern_core::DividerBlock;
use tern_core::DividerStyle;
use tern_core::ExecutionResult;
use tern_core::ListBlock;
use tern_core::MessageKind;
use tern_core::ResultsBlock;
use tern_core::TableBlock;
use tern_core::TextStyle;
use tern_core::TodoItem;
use tern_core::TodoListBlock;
use tern_core::TodoStatus;
use tracing::debug;
use tracing::info;

use crate::contracts::AgentRecord;
use crate::contracts::AgentSource;
use crate::contracts::FeedUpdate;
use crate::contracts::LogRecord;
use crate::contracts::LogRecordSource;
use crate::contracts::StepRecord;
use crate::contracts::WorkflowRecord;
use crate::contracts::WorkflowSource;

/// Polls every collaborator interface of `source` once. Updates come back
/// grouped by interface: agents, then workflows, then logs.
pub fn poll_sources<S>(source: &mut S) -> Vec<FeedUpdate>
where
    S: AgentSource + WorkflowSource + LogRecordSource + ?Sized,
{
    let mut updates = source.poll_agents();
    updates.extend(source.poll_workflows());
    updates.extend(source.poll_logs().into_iter().map(FeedUpdate::Log));
    updates
}

#[derive(Debug, Clone, Default)]
pub struct ScriptedFeed {
    batches: VecDeque<Vec<FeedUpdate>>,
    current: Vec<FeedUpdate>,
}

impl ScriptedFeed {
    pub fn new(batches: impl IntoIterator<Item = Vec<FeedUpdate>>) -> Self {
        Self {
            batches: batches.into_iter().collect(),
            current: Vec::new(),
        }
    }

    pub fn advance(&mut self) -> bool {
        match self.batches.pop_front() {
            Some(batch) => {
                self.current = batch;
                true
            }
            None => {
                self.current.clear();
                false
            }
        }
    }

    pub fn take_rest(&mut self) -> Vec<FeedUpdate> {
        std::mem::take(&mut self.current)
    }

    pub fn remaining(&self) -> usize {
        self.batches.len()
    }

    fn take_matching(&mut self, keep: impl Fn(&FeedUpdate) -> bool) -> Vec<FeedUpdate> {
        let (taken, rest): (Vec<FeedUpdate>, Vec<FeedUpdate>) = std::mem::take(&mut self.current)
            .into_iter()
            .partition(|update| keep(update));
        self.current = rest;
        taken
    }

    pub fn next_batch(&mut self) -> Option<Vec<FeedUpdate>> {
        self.advance().then(|| self.take_rest())
    }

    pub fn spawn(self, tx: Sender<FeedUpdate>, interval: Duration) -> FeedHandle {
        let stop = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&stop);
        let join = thread::spawn(move || {
            let mut feed = self;
            while !flag.load(Ordering::Relaxed) {
                let Some(batch) = feed.next_batch() else {
                    info!("demo feed finished");
                    break;
                };
                debug!(updates = batch.len(), remaining = feed.remaining(), "feed tick");
                for update in batch {
                    if tx.send(update).is_err() {
                        return;
                    }
                }
                thread::sleep(interval);
            }
        });
        FeedHandle {
            stop,
            join: Some(join),
        }
    }

    pub fn demo() -> Self {
        Self::new(demo_script())
    }
}

impl AgentSource for ScriptedFeed {
    fn poll_agents(&mut self) -> Vec<FeedUpdate> {
        self.take_matching(|update| {
            matches!(update, FeedUpdate::Agent(_) | FeedUpdate::AgentRemoved(_))
        })
    }
}

impl WorkflowSource for ScriptedFeed {
    fn poll_workflows(&mut self) -> Vec<FeedUpdate> {
        self.take_matching(|update| {
            matches!(
                update,
                FeedUpdate::Workflow(_) | FeedUpdate::WorkflowRemoved(_)
            )
        })
    }
}

impl LogRecordSource for ScriptedFeed {
    fn poll_logs(&mut self) -> Vec<LogRecord> {
        self.take_matching(|update| matches!(update, FeedUpdate::Log(_)))
            .into_iter()
            .filter_map(|update| match update {
                FeedUpdate::Log(record) => Some(record),
                _ => None,
            })
            .collect()
    }
}

#[derive(Debug)]
pub struct FeedHandle {
    stop: Arc<AtomicBool>,
    join: Option<JoinHandle<()>>,
}

impl FeedHandle {
    pub fn stop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(join) = self.join.take() {
            let _ = join.join();
        }
    }
}

impl Drop for FeedHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

fn agent(id: &str, name: &str, status: &str, model: &str) -> FeedUpdate {
    FeedUpdate::Agent(AgentRecord {
        id: id.to_string(),
        name: name.to_string(),
        status: status.to_string(),
        metadata: [("model".to_string(), json!(model))].into_iter().collect(),
    })
}

fn workflow(status: &str, steps: [&str; 4]) -> FeedUpdate {
    let names = ["scan", "plan", "edit", "verify"];
    FeedUpdate::Workflow(WorkflowRecord {
        id: "wf-refactor".to_string(),
        name: "refactor parser".to_string(),
        status: status.to_string(),
        steps: names
            .iter()
            .zip(steps)
            .map(|(name, status)| StepRecord {
                name: name.to_string(),
                status: status.to_string(),
            })
            .collect(),
    })
}

fn log(level: &str, message: &str) -> FeedUpdate {
    FeedUpdate::Log(LogRecord {
        timestamp: None,
        level: level.to_string(),
        message: message.to_string(),
        source: Some("demo".to_string()),
    })
}

fn message(id: &str, kind: MessageKind, blocks: Vec<ContentBlock>) -> FeedUpdate {
    FeedUpdate::Message(ChatMessage::new(id, kind, blocks))
}

fn todo(description: &str, status: TodoStatus) -> TodoItem {
    TodoItem {
        description: description.to_string(),
        status,
        result: None,
    }
}

fn demo_script() -> Vec<Vec<FeedUpdate>> {
    let mut script = vec![
        vec![
            FeedUpdate::Loading(true),
            agent("planner", "Planner", "idle", "local-7b"),
            agent("coder", "Coder", "idle", "local-13b"),
            log("info", "agent manager connected"),
            message(
                "m-user-1",
                MessageKind::User,
                vec![ContentBlock::text("Refactor the config parser and add tests.")],
            ),
        ],
        vec![
            agent("planner", "Planner", "thinking", "local-7b"),
            workflow("running", ["running", "pending", "pending", "pending"]),
            message(
                "m-plan",
                MessageKind::Assistant,
                vec![
                    ContentBlock::text("Here is the plan:"),
                    ContentBlock::TodoList(TodoListBlock {
                        items: vec![
                            todo("Scan the parser module", TodoStatus::Completed),
                            todo("Split tokenizer from parser", TodoStatus::InProgress),
                            todo("Add regression tests", TodoStatus::Pending),
                        ],
                        current_index: Some(1),
                    }),
                ],
            ),
        ],
        vec![
            agent("coder", "Coder", "working", "local-13b"),
            workflow("running", ["done", "done", "running", "pending"]),
            message(
                "m-actions",
                MessageKind::Assistant,
                vec![ContentBlock::ActionList(ActionListBlock {
                    actions: vec![
                        ActionItem {
                            id: "act-1".to_string(),
                            description: "Read the parser".to_string(),
                            command: "read_file".to_string(),
                            parameters: json!({"path": "src/parser.rs"}),
                        },
                        ActionItem {
                            id: "act-2".to_string(),
                            description: "Run the test suite".to_string(),
                            command: "run_command".to_string(),
                            parameters: json!({"command": "cargo test -p parser"}),
                        },
                        ActionItem {
                            id: "act-3".to_string(),
                            description: "Look up the grammar notes".to_string(),
                            command: "search_docs".to_string(),
                            parameters: json!({"query": "grammar"}),
                        },
                    ],
                    show_commands: None,
                    show_parameters: None,
                })],
            ),
        ],
        vec![
            log("warn", "test run took longer than 5s"),
            message(
                "m-results",
                MessageKind::Tool,
                vec![ContentBlock::Results(ResultsBlock {
                    results: vec![
                        ExecutionResult {
                            success: true,
                            message: "Read src/parser.rs".to_string(),
                            output: None,
                            error: None,
                        },
                        ExecutionResult {
                            success: false,
                            message: "cargo test -p parser".to_string(),
                            output: Some(
                                "running 12 tests\ntest lex::ident ... ok\ntest lex::number ... ok\ntest parse::nested ... FAILED\ntest parse::empty ... ok"
                                    .to_string(),
                            ),
                            error: Some("1 test failed".to_string()),
                        },
                    ],
                })],
            ),
        ],
        vec![
            message(
                "m-diff",
                MessageKind::Assistant,
                vec![
                    ContentBlock::Diff(DiffBlock {
                        file_path: Some("src/parser.rs".to_string()),
                        deletions: vec!["    let depth = 0;".to_string()],
                        additions: vec![
                            "    let mut depth = 0;".to_string(),
                            "    depth += 1;".to_string(),
                        ],
                    }),
                    ContentBlock::Divider(DividerBlock {
                        style: DividerStyle::Dot,
                    }),
                    ContentBlock::Code(CodeBlock {
                        filename: Some("src/parser.rs".to_string()),
                        language: Some("rust".to_string()),
                        content: "fn nested(input: &str) -> usize {\n    let mut depth = 0;\n    depth += 1;\n    depth\n}".to_string(),
                    }),
                ],
            ),
            FeedUpdate::Message(ChatMessage::confirmation(
                "m-confirm-1",
                "confirm-apply",
                vec![ContentBlock::text("Apply this change to src/parser.rs?")],
            )),
        ],
        vec![
            agent("coder", "Coder", "waiting", "local-13b"),
            workflow("paused", ["done", "done", "done", "pending"]),
            FeedUpdate::Loading(false),
            message(
                "m-summary",
                MessageKind::Assistant,
                vec![
                    ContentBlock::List(ListBlock {
                        items: vec![
                            "tokenizer extracted".to_string(),
                            "nested depth fixed".to_string(),
                        ],
                        ordered: false,
                    }),
                    ContentBlock::Table(TableBlock {
                        headers: vec!["module".to_string(), "tests".to_string()],
                        rows: vec![
                            vec!["lex".to_string(), "8".to_string()],
                            vec!["parse".to_string(), "4".to_string()],
                        ],
                    }),
                    ContentBlock::styled("Waiting for approval.", TextStyle::Warning),
                ],
            ),
        ],
        vec![
            FeedUpdate::Error(
                "model endpoint timed out\n    at request (client.js:88:13)".to_string(),
            ),
            log("error", "model endpoint timed out"),
            agent("reviewer", "Reviewer", "hibernating", "local-7b"),
            FeedUpdate::Message(ChatMessage::confirmation(
                "m-confirm-2",
                "confirm-retry",
                vec![ContentBlock::text("Retry the last step with a smaller model?")],
            )),
        ],
    ];

    let chatter = (1..=6)
        .map(|n| {
            vec![
                log("debug", &format!("heartbeat {n}")),
                message(
                    &format!("m-note-{n}"),
                    MessageKind::System,
                    vec![ContentBlock::styled(
                        format!("Background check {n} passed."),
                        TextStyle::Muted,
                    )],
                ),
            ]
        })
        .collect::<Vec<_>>();
    script.extend(chatter);
    script.push(vec![
        agent("planner", "Planner", "completed", "local-7b"),
        FeedUpdate::AgentRemoved("reviewer".to_string()),
        log("info", "session idle"),
    ]);
    script
}

#[cfg(test)]
mod tests {
    use std::sync::mpsc;

    use pretty_assertions::assert_eq;

    use super::*;

    fn kinds(batch: &[FeedUpdate]) -> Vec<&'static str> {
        batch
            .iter()
            .map(|update| match update {
                FeedUpdate::Agent(_) => "agent",
                FeedUpdate::AgentRemoved(_) => "agent-removed",
                FeedUpdate::Workflow(_) => "workflow",
                FeedUpdate::WorkflowRemoved(_) => "workflow-removed",
                FeedUpdate::Log(_) => "log",
                FeedUpdate::Message(_) => "message",
                FeedUpdate::Loading(_) => "loading",
                FeedUpdate::Error(_) => "error",
            })
            .collect()
    }

    fn mixed_batch() -> Vec<FeedUpdate> {
        vec![
            FeedUpdate::Loading(true),
            log("info", "a"),
            FeedUpdate::WorkflowRemoved("w".into()),
            FeedUpdate::AgentRemoved("x".into()),
        ]
    }

    #[test]
    fn next_batch_keeps_script_order() {
        let mut feed = ScriptedFeed::new([mixed_batch()]);

        let batch = feed.next_batch().expect("one batch");
        assert_eq!(
            kinds(&batch),
            vec!["loading", "log", "workflow-removed", "agent-removed"]
        );
        assert!(feed.next_batch().is_none());
    }

    #[test]
    fn polling_sources_groups_by_interface() {
        let mut feed = ScriptedFeed::new([mixed_batch()]);
        assert!(feed.advance());

        let polled = poll_sources(&mut feed);
        assert_eq!(kinds(&polled), vec!["agent-removed", "workflow-removed", "log"]);
        assert_eq!(kinds(&feed.take_rest()), vec!["loading"]);
        assert!(!feed.advance());
    }

    #[test]
    fn demo_script_plays_to_completion() {
        let mut feed = ScriptedFeed::demo();
        let mut confirmations = 0;
        let mut messages = 0;
        while let Some(batch) = feed.next_batch() {
            for update in batch {
                if let FeedUpdate::Message(message) = update {
                    messages += 1;
                    if message.is_pending_confirmation() {
                        confirmations += 1;
                    }
                }
            }
        }
        assert_eq!(confirmations, 2);
        assert_eq!(feed.remaining(), 0);
        assert!(messages > 10);
    }

    #[test]
    fn spawned_feed_delivers_in_order_and_stops() {
        let (tx, rx) = mpsc::channel();
        let feed = ScriptedFeed::new([
            vec![log("info", "one")],
            vec![log("info", "two")],
        ]);
        let mut handle = feed.spawn(tx, Duration::from_millis(1));

        let received: Vec<String> = rx
            .iter()
            .filter_map(|update| match update {
                FeedUpdate::Log(record) => Some(record.message),
                _ => None,
            })
            .collect();
        handle.stop();

        assert_eq!(received, vec!["one", "two"]);
    }
}
