use super::actions::UiAction;
use super::state::UiState;

pub fn reduce(state: &UiState, action: &UiAction) -> UiState {
    let mut next = state.clone();
    apply(&mut next, action);
    next
}

fn apply(state: &mut UiState, action: &UiAction) {
    match action {
        UiAction::SetView { view } => {
            state.current_view = *view;
        }
        UiAction::UpsertAgent { agent } => {
            state.agents.insert(agent.id.clone(), agent.clone());
        }
        UiAction::RemoveAgent { id } => {
            state.agents.remove(id);
            if state.selected_agent_id.as_deref() == Some(id.as_str()) {
                state.selected_agent_id = None;
            }
        }
        UiAction::UpsertWorkflow { workflow } => {
            state
                .workflows
                .insert(workflow.id.clone(), workflow.clone());
        }
        UiAction::RemoveWorkflow { id } => {
            state.workflows.remove(id);
            if state.selected_workflow_id.as_deref() == Some(id.as_str()) {
                state.selected_workflow_id = None;
            }
        }
        UiAction::AppendLog { entry } => {
            state.logs.push(entry.clone());
        }
        UiAction::ClearLogs => {
            state.logs.clear();
        }
        UiAction::SelectAgent { id } => {
            state.selected_agent_id = id.clone();
        }
        UiAction::SelectWorkflow { id } => {
            state.selected_workflow_id = id.clone();
        }
        UiAction::SetLoading { loading } => {
            state.is_loading = *loading;
        }
        UiAction::SetError { message } => {
            state.error = Some(message.clone());
        }
        UiAction::ClearError => {
            state.error = None;
        }
        UiAction::Unknown => {}
    }
}

#[cfg(test)]
mod tests;
