use std::any::Any;
use std::cell::RefCell;
use std::panic::catch_unwind;
use std::panic::AssertUnwindSafe;
use std::rc::Rc;
use std::rc::Weak;

use tracing::error;
use tracing::trace;
use tracing::warn;

use super::state::AgentDisplay;
use super::state::LogEntry;
use super::state::ViewType;
use super::state::WorkflowDisplay;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiEvent {
    AgentUpdated(AgentDisplay),
    AgentRemoved(String),
    WorkflowUpdated(WorkflowDisplay),
    WorkflowRemoved(String),
    LogAppended(LogEntry),
    ViewChanged(ViewType),
    ErrorRaised(String),
    Exit,
}

impl UiEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            Self::AgentUpdated(_) => EventKind::AgentUpdated,
            Self::AgentRemoved(_) => EventKind::AgentRemoved,
            Self::WorkflowUpdated(_) => EventKind::WorkflowUpdated,
            Self::WorkflowRemoved(_) => EventKind::WorkflowRemoved,
            Self::LogAppended(_) => EventKind::LogAppended,
            Self::ViewChanged(_) => EventKind::ViewChanged,
            Self::ErrorRaised(_) => EventKind::ErrorRaised,
            Self::Exit => EventKind::Exit,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EventKind {
    AgentUpdated,
    AgentRemoved,
    WorkflowUpdated,
    WorkflowRemoved,
    LogAppended,
    ViewChanged,
    ErrorRaised,
    Exit,
}

impl EventKind {
    pub const ALL: [EventKind; 8] = [
        Self::AgentUpdated,
        Self::AgentRemoved,
        Self::WorkflowUpdated,
        Self::WorkflowRemoved,
        Self::LogAppended,
        Self::ViewChanged,
        Self::ErrorRaised,
        Self::Exit,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::AgentUpdated => "agent-updated",
            Self::AgentRemoved => "agent-removed",
            Self::WorkflowUpdated => "workflow-updated",
            Self::WorkflowRemoved => "workflow-removed",
            Self::LogAppended => "log-appended",
            Self::ViewChanged => "view-changed",
            Self::ErrorRaised => "error-raised",
            Self::Exit => "exit",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum HandlerError {
    #[error("{0}")]
    Failed(String),
    #[error("handler for {expected} received {actual}")]
    UnexpectedEvent {
        expected: &'static str,
        actual: &'static str,
    },
}

impl HandlerError {
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }
}

pub type HandlerResult = Result<(), HandlerError>;

type HandlerFn = dyn FnMut(&UiEvent) -> HandlerResult;

#[derive(Clone)]
pub struct SharedHandler(Rc<RefCell<HandlerFn>>);

impl SharedHandler {
    pub fn new(handler: impl FnMut(&UiEvent) -> HandlerResult + 'static) -> Self {
        Self(Rc::new(RefCell::new(handler)))
    }

    pub fn ptr_eq(&self, other: &SharedHandler) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    fn call(&self, event: &UiEvent) -> Option<HandlerResult> {
        let mut handler = self.0.try_borrow_mut().ok()?;
        Some((*handler)(event))
    }
}

impl std::fmt::Debug for SharedHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("SharedHandler")
            .field(&Rc::as_ptr(&self.0).cast::<()>())
            .finish()
    }
}

struct Slot {
    id: u64,
    kind: EventKind,
    handler: SharedHandler,
    once: bool,
}

#[derive(Default)]
struct BusInner {
    next_id: u64,
    slots: Vec<Slot>,
}

impl BusInner {
    fn insert(&mut self, kind: EventKind, handler: SharedHandler, once: bool) -> u64 {
        self.next_id += 1;
        let id = self.next_id;
        self.slots.push(Slot {
            id,
            kind,
            handler,
            once,
        });
        id
    }

    fn remove(&mut self, id: u64) -> bool {
        let before = self.slots.len();
        self.slots.retain(|slot| slot.id != id);
        self.slots.len() != before
    }

    fn contains(&self, id: u64) -> bool {
        self.slots.iter().any(|slot| slot.id == id)
    }
}

#[derive(Clone, Default)]
pub struct EventBus {
    inner: Rc<RefCell<BusInner>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, kind: EventKind, handler: SharedHandler) -> Subscription {
        self.attach(kind, handler, false)
    }

    /// The handler is detached before it runs, so it fires at most once even
    /// if it publishes the same kind again.
    pub fn subscribe_once(&self, kind: EventKind, handler: SharedHandler) -> Subscription {
        self.attach(kind, handler, true)
    }

    fn attach(&self, kind: EventKind, handler: SharedHandler, once: bool) -> Subscription {
        let id = self.inner.borrow_mut().insert(kind, handler, once);
        trace!(kind = kind.label(), id, once, "subscribe");
        Subscription {
            bus: Rc::downgrade(&self.inner),
            id,
            kind,
            attached: true,
        }
    }

    pub fn publish(&self, event: UiEvent) {
        let kind = event.kind();
        let targets: Vec<(u64, SharedHandler, bool)> = self
            .inner
            .borrow()
            .slots
            .iter()
            .filter(|slot| slot.kind == kind)
            .map(|slot| (slot.id, slot.handler.clone(), slot.once))
            .collect();
        trace!(kind = kind.label(), handlers = targets.len(), "publish");

        for (id, handler, once) in targets {
            if !self.inner.borrow().contains(id) {
                continue;
            }
            if once {
                self.inner.borrow_mut().remove(id);
            }

            match catch_unwind(AssertUnwindSafe(|| handler.call(&event))) {
                Ok(Some(Ok(()))) => {}
                Ok(Some(Err(err))) => {
                    warn!(kind = kind.label(), id, error = %err, "event handler failed");
                }
                Ok(None) => {
                    warn!(kind = kind.label(), id, "skipping re-entrant event handler");
                }
                Err(payload) => {
                    error!(
                        kind = kind.label(),
                        id,
                        panic = %panic_message(payload.as_ref()),
                        "event handler panicked"
                    );
                }
            }
        }
    }

    pub fn handler_count(&self, kind: EventKind) -> usize {
        self.inner
            .borrow()
            .slots
            .iter()
            .filter(|slot| slot.kind == kind)
            .count()
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("handlers", &self.inner.borrow().slots.len())
            .finish()
    }
}

pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[must_use = "dropping a Subscription detaches its handler immediately"]
#[derive(Debug)]
pub struct Subscription {
    bus: Weak<RefCell<BusInner>>,
    id: u64,
    kind: EventKind,
    attached: bool,
}

impl Subscription {
    pub fn kind(&self) -> EventKind {
        self.kind
    }

    /// Safe to call repeatedly, after a one-shot handler fired, or after the
    /// bus itself was dropped.
    pub fn unsubscribe(&mut self) {
        if !self.attached {
            return;
        }
        self.attached = false;
        if let Some(inner) = self.bus.upgrade() {
            if let Ok(mut inner) = inner.try_borrow_mut() {
                inner.remove(self.id);
            }
        }
    }

    pub fn is_active(&self) -> bool {
        self.attached
            && self
                .bus
                .upgrade()
                .is_some_and(|inner| inner.borrow().contains(self.id))
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}
