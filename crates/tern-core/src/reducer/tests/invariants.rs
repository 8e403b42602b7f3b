use super::*;
use pretty_assertions::assert_eq;

fn script() -> Vec<UiAction> {
    vec![
        UiAction::UpsertAgent {
            agent: agent("planner", AgentStatus::Thinking),
        },
        UiAction::UpsertWorkflow {
            workflow: workflow("w1", WorkflowStatus::Running, &[("scan", StepStatus::Running)]),
        },
        UiAction::SelectAgent {
            id: Some("planner".to_string()),
        },
        UiAction::AppendLog {
            entry: log("started", LogLevel::Info, 0),
        },
        UiAction::SetLoading { loading: true },
        UiAction::Unknown,
        UiAction::SetError {
            message: "timeout".to_string(),
        },
        UiAction::SetView {
            view: ViewType::Dashboard,
        },
        UiAction::RemoveAgent {
            id: "planner".to_string(),
        },
    ]
}

#[test]
fn initial_state_matches_documented_defaults() {
    let state = state();
    assert_eq!(state.current_view, ViewType::Chat);
    assert!(state.agents.is_empty());
    assert!(state.workflows.is_empty());
    assert!(state.logs.is_empty());
    assert_eq!(state.selected_agent_id, None);
    assert_eq!(state.selected_workflow_id, None);
    assert!(!state.is_loading);
    assert_eq!(state.error, None);
}

#[test]
fn same_actions_from_same_state_yield_same_state() {
    let first = run_all(&state(), &script());
    let second = run_all(&state(), &script());
    assert_eq!(first, second);
}

#[test]
fn reduce_never_mutates_its_input() {
    let mut current = state();
    for action in script() {
        let snapshot = current.clone();
        let next = reduce(&current, &action);
        assert_eq!(current, snapshot, "{} mutated its input", action.kind());
        current = next;
    }
}

#[test]
fn unknown_action_leaves_state_equal() {
    let populated = run_all(&state(), &script());
    assert_unchanged(&populated, UiAction::Unknown);
    assert_unchanged(&state(), UiAction::Unknown);
}

#[test]
fn decoded_future_action_is_a_no_op() {
    let populated = run_all(&state(), &script());
    let action: UiAction =
        serde_json::from_str(r#"{"type":"pin_message","id":"m1"}"#).expect("decode");
    assert_unchanged(&populated, action);
}

#[test]
fn every_action_in_script_applies_in_order() {
    let next = run_all(&state(), &script());
    assert!(next.agents.is_empty());
    assert_eq!(next.selected_agent_id, None);
    assert_eq!(next.workflows.len(), 1);
    assert_eq!(next.logs.len(), 1);
    assert!(next.is_loading);
    assert_eq!(next.error.as_deref(), Some("timeout"));
    assert_eq!(next.current_view, ViewType::Dashboard);
}
