use std::cell::Cell;
use std::cell::RefCell;
use std::panic::catch_unwind;
use std::panic::AssertUnwindSafe;
use std::rc::Rc;

use tracing::error;
use tracing::info;
use tracing::warn;

use super::actions::UiAction;
use super::bus::panic_message;
use super::bus::EventBus;
use super::bus::EventKind;
use super::bus::HandlerError;
use super::bus::HandlerResult;
use super::bus::SharedHandler;
use super::bus::Subscription;
use super::bus::UiEvent;
use super::sanitize::sanitize_text;
use super::store::Store;

#[derive(Debug)]
pub struct Binding {
    bus: EventBus,
    kind: EventKind,
    handler: SharedHandler,
    subscription: Subscription,
}

impl Binding {
    pub fn new(bus: &EventBus, kind: EventKind, handler: SharedHandler) -> Self {
        let subscription = bus.subscribe(kind, handler.clone());
        Self {
            bus: bus.clone(),
            kind,
            handler,
            subscription,
        }
    }

    pub fn rebind(&mut self, kind: EventKind, handler: SharedHandler) -> bool {
        if kind == self.kind && handler.ptr_eq(&self.handler) {
            return false;
        }
        self.subscription.unsubscribe();
        self.subscription = self.bus.subscribe(kind, handler.clone());
        self.kind = kind;
        self.handler = handler;
        true
    }

    pub fn kind(&self) -> EventKind {
        self.kind
    }

    pub fn is_active(&self) -> bool {
        self.subscription.is_active()
    }
}

#[derive(Debug, Default)]
pub struct MultiBinding {
    subscriptions: Vec<Subscription>,
}

impl MultiBinding {
    pub fn new(
        bus: &EventBus,
        handlers: impl IntoIterator<Item = (EventKind, SharedHandler)>,
    ) -> Self {
        let subscriptions = handlers
            .into_iter()
            .map(|(kind, handler)| bus.subscribe(kind, handler))
            .collect();
        Self { subscriptions }
    }

    pub fn kinds(&self) -> Vec<EventKind> {
        self.subscriptions.iter().map(Subscription::kind).collect()
    }

    pub fn unbind(&mut self) {
        self.subscriptions.clear();
    }
}

/// One handler on every kind in [`EventKind::ALL`].
///
/// The same handler instance backs every subscription, so a catch-all handler
/// that publishes from inside itself will not see that nested event.
#[derive(Debug)]
pub struct CatchAllBinding {
    inner: MultiBinding,
}

impl CatchAllBinding {
    pub fn new(
        bus: &EventBus,
        mut handler: impl FnMut(EventKind, &UiEvent) -> HandlerResult + 'static,
    ) -> Self {
        let shared = SharedHandler::new(move |event| handler(event.kind(), event));
        let inner = MultiBinding::new(
            bus,
            EventKind::ALL.iter().map(|kind| (*kind, shared.clone())),
        );
        Self { inner }
    }

    pub fn unbind(&mut self) {
        self.inner.unbind();
    }
}

pub fn guarded(
    label: impl Into<String>,
    mut handler: impl FnMut(&UiEvent) -> HandlerResult + 'static,
) -> SharedHandler {
    let label = label.into();
    SharedHandler::new(move |event| {
        match catch_unwind(AssertUnwindSafe(|| handler(event))) {
            Ok(Ok(())) => {}
            Ok(Err(err)) => {
                warn!(binding = %label, kind = event.kind().label(), error = %err, "handler failed");
            }
            Err(payload) => {
                error!(
                    binding = %label,
                    kind = event.kind().label(),
                    panic = %panic_message(payload.as_ref()),
                    "handler panicked"
                );
            }
        }
        Ok(())
    })
}

#[derive(Debug)]
pub struct OnceBinding {
    fired: Rc<Cell<bool>>,
    subscription: Subscription,
}

impl OnceBinding {
    pub fn new(
        bus: &EventBus,
        kind: EventKind,
        mut handler: impl FnMut(&UiEvent) -> HandlerResult + 'static,
    ) -> Self {
        let fired = Rc::new(Cell::new(false));
        let flag = Rc::clone(&fired);
        let subscription = bus.subscribe_once(
            kind,
            SharedHandler::new(move |event| {
                flag.set(true);
                handler(event)
            }),
        );
        Self {
            fired,
            subscription,
        }
    }

    pub fn has_fired(&self) -> bool {
        self.fired.get()
    }

    pub fn is_active(&self) -> bool {
        self.subscription.is_active()
    }
}

pub fn action_for(event: &UiEvent) -> Option<UiAction> {
    let action = match event {
        UiEvent::AgentUpdated(agent) => UiAction::UpsertAgent {
            agent: agent.clone(),
        },
        UiEvent::AgentRemoved(id) => UiAction::RemoveAgent { id: id.clone() },
        UiEvent::WorkflowUpdated(workflow) => UiAction::UpsertWorkflow {
            workflow: workflow.clone(),
        },
        UiEvent::WorkflowRemoved(id) => UiAction::RemoveWorkflow { id: id.clone() },
        UiEvent::LogAppended(entry) => UiAction::AppendLog {
            entry: entry.clone(),
        },
        UiEvent::ViewChanged(view) => UiAction::SetView { view: *view },
        UiEvent::ErrorRaised(message) => UiAction::SetError {
            message: sanitize_text(message),
        },
        UiEvent::Exit => return None,
    };
    Some(action)
}

const STORE_KINDS: [EventKind; 7] = [
    EventKind::AgentUpdated,
    EventKind::AgentRemoved,
    EventKind::WorkflowUpdated,
    EventKind::WorkflowRemoved,
    EventKind::LogAppended,
    EventKind::ViewChanged,
    EventKind::ErrorRaised,
];

pub fn bind_store(bus: &EventBus, store: &Rc<RefCell<Store>>) -> MultiBinding {
    let handlers = STORE_KINDS.iter().map(|kind| {
        let kind = *kind;
        let store = Rc::clone(store);
        let handler = guarded(format!("store:{}", kind.label()), move |event| {
            let action = action_for(event).ok_or(HandlerError::UnexpectedEvent {
                expected: kind.label(),
                actual: event.kind().label(),
            })?;
            store
                .try_borrow_mut()
                .map_err(|_| HandlerError::failed("store is borrowed elsewhere"))?
                .dispatch(action);
            Ok(())
        });
        (kind, handler)
    });
    MultiBinding::new(bus, handlers)
}

pub type ExitCallback = Box<dyn FnMut()>;

/// Runs `on_exit` when `Exit` is published. Without a callback the process
/// terminates with status 0.
pub fn bind_exit(bus: &EventBus, on_exit: Option<ExitCallback>) -> Binding {
    let mut on_exit = on_exit;
    let handler = guarded("exit", move |_| {
        match on_exit.as_mut() {
            Some(callback) => callback(),
            None => {
                info!("exit requested, terminating");
                std::process::exit(0);
            }
        }
        Ok(())
    });
    Binding::new(bus, EventKind::Exit, handler)
}
