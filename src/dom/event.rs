use std::cell::Cell;

use serde::Serialize;
use serde_json::Value;

use crate::dom::document::NodeId;

/// Cancellation flags shared by the raw browser events.
#[derive(Debug, Default)]
pub struct EventFlags {
    default_prevented: Cell<bool>,
    propagation_stopped: Cell<bool>,
}

impl EventFlags {
    pub fn default_prevented(&self) -> bool {
        self.default_prevented.get()
    }

    pub fn prevent_default(&self) {
        self.default_prevented.set(true);
    }

    pub fn propagation_stopped(&self) -> bool {
        self.propagation_stopped.get()
    }

    pub fn stop_immediate_propagation(&self) {
        self.propagation_stopped.set(true);
    }
}

/// A `submit` event fired on a form.
#[derive(Debug)]
pub struct SubmitEvent {
    pub target: NodeId,
    pub submitter: Option<NodeId>,
    pub flags: EventFlags,
}

impl SubmitEvent {
    pub fn new(target: NodeId, submitter: Option<NodeId>) -> Self {
        Self {
            target,
            submitter,
            flags: EventFlags::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub alt: bool,
    pub ctrl: bool,
    pub meta: bool,
    pub shift: bool,
}

impl Modifiers {
    pub fn any(self) -> bool {
        self.alt || self.ctrl || self.meta || self.shift
    }
}

/// A `click` event. `button` follows `MouseEvent.button`: 0 is the primary button.
#[derive(Debug)]
pub struct ClickEvent {
    pub target: NodeId,
    pub button: u16,
    pub modifiers: Modifiers,
    pub flags: EventFlags,
}

impl ClickEvent {
    /// Unmodified primary-button click.
    pub fn primary(target: NodeId) -> Self {
        Self {
            target,
            button: 0,
            modifiers: Modifiers::default(),
            flags: EventFlags::default(),
        }
    }

    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    pub fn with_button(mut self, button: u16) -> Self {
        self.button = button;
        self
    }
}

/// Notification dispatched on an element for external observers.
#[derive(Debug, Clone)]
pub struct CustomEvent {
    pub kind: String,
    pub target: NodeId,
    pub detail: Value,
    pub bubbles: bool,
}

impl CustomEvent {
    pub fn bubbling(kind: &str, target: NodeId, detail: Value) -> Self {
        Self {
            kind: kind.to_string(),
            target,
            detail,
            bubbles: true,
        }
    }
}

/// Entry in the document event log: `(type, target id, detail)`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoggedEvent {
    pub kind: String,
    pub target_id: Option<String>,
    pub detail: Value,
}
