use url::Url;

use crate::dom::document::{Document, NodeId};
use crate::dom::event::ClickEvent;
use crate::observers::interception::Intent;

/// Capture stage: the followable link a click landed on, if any.
///
/// Only unmodified primary-button clicks on `a[href]`/`area[href]` count.
/// Downloads and links aimed at another browsing context are skipped.
pub fn link_candidate(document: &Document, event: &ClickEvent) -> Option<NodeId> {
    if event.flags.default_prevented() || event.button != 0 || event.modifiers.any() {
        return None;
    }

    let link = document.closest(event.target, |node| {
        (document.is(node, "a") || document.is(node, "area")) && document.has_attribute(node, "href")
    })?;

    if document.has_attribute(link, "download") {
        return None;
    }

    match document.non_empty_attribute(link, "target").as_deref() {
        None | Some("_self") => Some(link),
        Some(_) => None,
    }
}

/// Bubble stage: resolve the link's location. Cross-origin links and
/// unparseable hrefs stay with the browser.
pub fn link_intent(document: &Document, event: &ClickEvent) -> Option<Intent> {
    let element = link_candidate(document, event)?;
    let href = document.attribute(element, "href")?;
    let url: Url = document.base_url().join(&href).ok()?;

    if url.origin() != document.url().origin() {
        return None;
    }

    Some(Intent::Link { element, url })
}
