use std::rc::Rc;

use tracing::debug;

use super::actions::UiAction;
use super::reducer::reduce;
use super::state::UiState;

#[derive(Debug, Default)]
pub struct Store {
    current: Rc<UiState>,
    revision: u64,
}

impl Store {
    pub fn new(initial: UiState) -> Self {
        Self {
            current: Rc::new(initial),
            revision: 0,
        }
    }

    pub fn dispatch(&mut self, action: UiAction) {
        debug!(action = action.kind(), revision = self.revision, "dispatch");
        self.current = Rc::new(reduce(&self.current, &action));
        self.revision += 1;
    }

    pub fn snapshot(&self) -> Rc<UiState> {
        Rc::clone(&self.current)
    }

    pub fn state(&self) -> &UiState {
        &self.current
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }
}
