use tracing::debug;

use crate::dom::document::{Document, NodeId};
use crate::dom::event::SubmitEvent;
use crate::drive::form_submission::{FormSubmission, raw_method};
use crate::observers::interception::Intent;

/// Capture stage: is this submit event one we may take over?
pub fn submit_candidate(document: &Document, event: &SubmitEvent) -> Option<NodeId> {
    if event.flags.default_prevented() || !document.is(event.target, "form") {
        return None;
    }
    Some(event.target)
}

/// Bubble stage: snapshot the submission. `dialog` submissions are left to
/// the browser, as are forms that cannot be turned into a submission.
pub fn form_intent(document: &Document, event: &SubmitEvent) -> Option<Intent> {
    let form = submit_candidate(document, event)?;

    if raw_method(document, form, event.submitter) == "dialog" {
        debug!(form = %document.node_label(form), "dialog submission left to the browser");
        return None;
    }

    match FormSubmission::new(document, form, event.submitter) {
        Ok(submission) => Some(Intent::Form { submission }),
        Err(e) => {
            debug!(form = %document.node_label(form), error = %e, "submission not interceptable");
            None
        }
    }
}
