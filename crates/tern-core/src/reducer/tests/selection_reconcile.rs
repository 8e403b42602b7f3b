use super::*;
use pretty_assertions::assert_eq;

fn with_agents(ids: &[&str]) -> UiState {
    let actions: Vec<UiAction> = ids
        .iter()
        .map(|id| UiAction::UpsertAgent {
            agent: agent(id, AgentStatus::Idle),
        })
        .collect();
    run_all(&state(), &actions)
}

#[test]
fn removing_selected_agent_clears_selection() {
    let before = reduce(
        &with_agents(&["a1", "a2"]),
        &UiAction::SelectAgent {
            id: Some("a1".to_string()),
        },
    );
    let next = reduce(
        &before,
        &UiAction::RemoveAgent {
            id: "a1".to_string(),
        },
    );
    assert_eq!(next.selected_agent_id, None);
    assert_eq!(next.selected_agent(), None);
}

#[test]
fn removing_other_agent_preserves_selection() {
    let before = reduce(
        &with_agents(&["a1", "a2"]),
        &UiAction::SelectAgent {
            id: Some("a1".to_string()),
        },
    );
    let next = reduce(
        &before,
        &UiAction::RemoveAgent {
            id: "a2".to_string(),
        },
    );
    assert_eq!(next.selected_agent_id.as_deref(), Some("a1"));
}

#[test]
fn removing_selected_workflow_clears_selection() {
    let next = run_all(
        &state(),
        &[
            UiAction::UpsertWorkflow {
                workflow: workflow("w1", WorkflowStatus::Running, &[]),
            },
            UiAction::SelectWorkflow {
                id: Some("w1".to_string()),
            },
            UiAction::RemoveWorkflow {
                id: "w1".to_string(),
            },
        ],
    );
    assert_eq!(next.selected_workflow_id, None);
}

#[test]
fn select_with_none_clears() {
    let before = reduce(
        &with_agents(&["a1"]),
        &UiAction::SelectAgent {
            id: Some("a1".to_string()),
        },
    );
    let next = reduce(&before, &UiAction::SelectAgent { id: None });
    assert_eq!(next.selected_agent_id, None);
}

#[test]
fn agent_and_workflow_selections_are_independent() {
    let next = run_all(
        &with_agents(&["shared"]),
        &[
            UiAction::UpsertWorkflow {
                workflow: workflow("shared", WorkflowStatus::Pending, &[]),
            },
            UiAction::SelectAgent {
                id: Some("shared".to_string()),
            },
            UiAction::SelectWorkflow {
                id: Some("shared".to_string()),
            },
            UiAction::RemoveWorkflow {
                id: "shared".to_string(),
            },
        ],
    );
    assert_eq!(next.selected_agent_id.as_deref(), Some("shared"));
    assert_eq!(next.selected_workflow_id, None);
}
