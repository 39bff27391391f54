use serde::Serialize;

use crate::dom::document::{Document, FRAME_TAG, NodeId};

/// Target name that escapes every enclosing scope.
pub const TOP: &str = "_top";

/// An addressable, possibly nested region of the page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Scope {
    pub id: String,
    pub element: NodeId,
    pub disabled: bool,
    /// The scope's own fallback target (its `target` attribute).
    pub target: Option<String>,
}

impl Scope {
    pub fn targets_top(&self) -> bool {
        self.target.as_deref() == Some(TOP)
    }
}

/// Lookup contract the resolver needs from the page.
pub trait ScopeRegistry {
    /// Non-disabled scope registered under `name`.
    fn scope_named(&self, name: &str) -> Option<Scope>;

    /// Nearest scope containing `node`, or `None` at the page root.
    fn enclosing_scope(&self, node: NodeId) -> Option<Scope>;
}

impl Document {
    pub fn scope_at(&self, element: NodeId) -> Option<Scope> {
        if !self.is(element, FRAME_TAG) {
            return None;
        }
        Some(Scope {
            id: self.attribute(element, "id").unwrap_or_default(),
            element,
            disabled: self.has_attribute(element, "disabled"),
            target: self.non_empty_attribute(element, "target"),
        })
    }

    pub fn scopes(&self) -> Vec<Scope> {
        self.document_order()
            .into_iter()
            .filter_map(|node| self.scope_at(node))
            .collect()
    }
}

impl ScopeRegistry for Document {
    fn scope_named(&self, name: &str) -> Option<Scope> {
        self.scopes()
            .into_iter()
            .find(|scope| scope.id == name && !scope.disabled)
    }

    fn enclosing_scope(&self, node: NodeId) -> Option<Scope> {
        self.closest(node, |id| self.is(id, FRAME_TAG))
            .and_then(|id| self.scope_at(id))
    }
}
