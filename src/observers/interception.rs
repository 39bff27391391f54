use std::rc::Rc;

use tracing::debug;
use url::Url;

use crate::dom::document::{Document, NodeId};
use crate::dom::event::{ClickEvent, EventFlags, SubmitEvent};
use crate::drive::form_submission::FormSubmission;
use crate::http::fetch_request::FetchMethod;
use crate::observers::form_submit_observer::{form_intent, submit_candidate};
use crate::observers::link_click_observer::{link_candidate, link_intent};

/// A navigation the user asked for, normalized from a raw browser event.
#[derive(Debug, Clone, PartialEq)]
pub enum Intent {
    Link { element: NodeId, url: Url },
    Form { submission: FormSubmission },
}

impl Intent {
    /// The clicked link or the submitted form.
    pub fn element(&self) -> NodeId {
        match self {
            Intent::Link { element, .. } => *element,
            Intent::Form { submission } => submission.form(),
        }
    }

    /// The invoking control of a form submission.
    pub fn control(&self) -> Option<NodeId> {
        match self {
            Intent::Link { .. } => None,
            Intent::Form { submission } => submission.submitter(),
        }
    }

    pub fn method(&self) -> Option<FetchMethod> {
        match self {
            Intent::Link { .. } => None,
            Intent::Form { submission } => Some(submission.method()),
        }
    }

    pub fn url(&self) -> &Url {
        match self {
            Intent::Link { url, .. } => url,
            Intent::Form { submission } => submission.location(),
        }
    }
}

/// Capability contract shared by everything that can take over a navigation.
pub trait InterceptionDelegate {
    fn should_intercept(&self, intent: &Intent) -> bool;
    fn intercepted(&self, intent: &Intent);
}

/// Two-stage listener for submit and click events.
///
/// The capture stage only records that an event is a candidate; the bubble
/// stage, run after page scripts had their chance to `preventDefault`, builds
/// the [`Intent`] and offers it to the registered hooks in registration
/// order. The first hook that accepts suppresses the default action and stops
/// propagation, so later hooks never see the event.
pub struct InterceptionObserver {
    document: Rc<Document>,
    hooks: Vec<Rc<dyn InterceptionDelegate>>,
    started: bool,
    pending_submit: Option<NodeId>,
    pending_click: Option<NodeId>,
}

impl InterceptionObserver {
    pub fn new(document: Rc<Document>) -> Self {
        Self {
            document,
            hooks: Vec::new(),
            started: false,
            pending_submit: None,
            pending_click: None,
        }
    }

    pub fn register(&mut self, hook: Rc<dyn InterceptionDelegate>) {
        self.hooks.push(hook);
    }

    pub fn start(&mut self) {
        self.started = true;
    }

    pub fn stop(&mut self) {
        self.started = false;
        self.pending_submit = None;
        self.pending_click = None;
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    // =========================================================================
    // Form submissions
    // =========================================================================

    pub fn submit_captured(&mut self, event: &SubmitEvent) {
        // Re-capturing replaces the previous candidate rather than stacking
        self.pending_submit = None;
        if self.started && submit_candidate(&self.document, event).is_some() {
            self.pending_submit = Some(event.target);
        }
    }

    /// Returns `true` when a hook took over the submission.
    pub fn submit_bubbled(&mut self, event: &SubmitEvent) -> bool {
        if self.pending_submit.take() != Some(event.target) {
            return false;
        }
        match form_intent(&self.document, event) {
            Some(intent) => self.offer(&intent, &event.flags),
            None => false,
        }
    }

    pub fn observe_submit(&mut self, event: &SubmitEvent) -> bool {
        self.submit_captured(event);
        self.submit_bubbled(event)
    }

    // =========================================================================
    // Link clicks
    // =========================================================================

    pub fn click_captured(&mut self, event: &ClickEvent) {
        self.pending_click = None;
        if self.started && link_candidate(&self.document, event).is_some() {
            self.pending_click = Some(event.target);
        }
    }

    pub fn click_bubbled(&mut self, event: &ClickEvent) -> bool {
        if self.pending_click.take() != Some(event.target) {
            return false;
        }
        match link_intent(&self.document, event) {
            Some(intent) => self.offer(&intent, &event.flags),
            None => false,
        }
    }

    pub fn observe_click(&mut self, event: &ClickEvent) -> bool {
        self.click_captured(event);
        self.click_bubbled(event)
    }

    fn offer(&self, intent: &Intent, flags: &EventFlags) -> bool {
        for hook in &self.hooks {
            if flags.default_prevented() || flags.propagation_stopped() {
                return false;
            }
            if hook.should_intercept(intent) {
                flags.prevent_default();
                flags.stop_immediate_propagation();
                debug!(element = %self.document.node_label(intent.element()), url = %intent.url(), "navigation intercepted");
                hook.intercepted(intent);
                return true;
            }
        }
        false
    }
}
