use std::cell::RefCell;
use std::collections::{BTreeMap, VecDeque};
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::dom::event::{CustomEvent, LoggedEvent};

/// Tag of the elements that act as navigation scopes.
pub const FRAME_TAG: &str = "turbo-frame";

/// Most recent notifications kept in [`Document::event_log`].
pub const EVENT_LOG_CAPACITY: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct NodeId(usize);

/// File attached to an `input[type=file]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileBlob {
    pub name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone)]
struct Element {
    tag: String,
    attrs: BTreeMap<String, String>,
    value: String,
    checked: bool,
    files: Vec<FileBlob>,
}

#[derive(Debug, Clone)]
struct Node {
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    element: Element,
}

type Listener = (NodeId, String, Rc<dyn Fn(&CustomEvent)>);

/// In-memory element tree standing in for the browser document.
///
/// Every accessor borrows the tree only for the duration of the call, so a
/// `Document` can be shared through `Rc` by observers, resolvers and
/// submission controllers living on the same event loop.
pub struct Document {
    url: Url,
    nodes: RefCell<Vec<Node>>,
    root: NodeId,
    cookie: RefCell<Vec<(String, String)>>,
    listeners: RefCell<Vec<Listener>>,
    event_log: RefCell<VecDeque<LoggedEvent>>,
}

impl std::fmt::Debug for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Document")
            .field("url", &self.url.as_str())
            .field("nodes", &self.nodes.borrow().len())
            .finish()
    }
}

impl Document {
    pub fn new(url: Url) -> Self {
        let root = Node {
            parent: None,
            children: Vec::new(),
            element: Element {
                tag: "html".into(),
                attrs: BTreeMap::new(),
                value: String::new(),
                checked: false,
                files: Vec::new(),
            },
        };

        Self {
            url,
            nodes: RefCell::new(vec![root]),
            root: NodeId(0),
            cookie: RefCell::new(Vec::new()),
            listeners: RefCell::new(Vec::new()),
            event_log: RefCell::new(VecDeque::new()),
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Base URL used to expand relative locations: the first `base[href]`
    /// resolved against the document URL, else the document URL itself.
    pub fn base_url(&self) -> Url {
        self.document_order()
            .into_iter()
            .filter(|&node| self.tag_name(node) == "base")
            .find_map(|node| self.attribute(node, "href"))
            .and_then(|href| self.url.join(&href).ok())
            .unwrap_or_else(|| self.url.clone())
    }

    // =========================================================================
    // Tree construction and mutation
    // =========================================================================

    pub fn append_element(&self, parent: NodeId, tag: &str, attrs: &[(&str, &str)]) -> NodeId {
        let attrs: BTreeMap<String, String> = attrs
            .iter()
            .map(|(k, v)| (k.to_ascii_lowercase(), v.to_string()))
            .collect();

        let value = attrs.get("value").cloned().unwrap_or_default();
        let checked = attrs.contains_key("checked");

        let mut nodes = self.nodes.borrow_mut();
        let id = NodeId(nodes.len());
        nodes.push(Node {
            parent: Some(parent),
            children: Vec::new(),
            element: Element {
                tag: tag.to_ascii_lowercase(),
                attrs,
                value,
                checked,
                files: Vec::new(),
            },
        });
        nodes[parent.0].children.push(id);
        id
    }

    pub fn set_attribute(&self, node: NodeId, name: &str, value: &str) {
        self.nodes.borrow_mut()[node.0]
            .element
            .attrs
            .insert(name.to_ascii_lowercase(), value.to_string());
    }

    pub fn remove_attribute(&self, node: NodeId, name: &str) {
        self.nodes.borrow_mut()[node.0]
            .element
            .attrs
            .remove(&name.to_ascii_lowercase());
    }

    pub fn set_value(&self, node: NodeId, value: &str) {
        self.nodes.borrow_mut()[node.0].element.value = value.to_string();
    }

    pub fn set_checked(&self, node: NodeId, checked: bool) {
        self.nodes.borrow_mut()[node.0].element.checked = checked;
    }

    pub fn attach_file(&self, node: NodeId, file: FileBlob) {
        self.nodes.borrow_mut()[node.0].element.files.push(file);
    }

    // =========================================================================
    // Element queries
    // =========================================================================

    pub fn tag_name(&self, node: NodeId) -> String {
        self.nodes.borrow()[node.0].element.tag.clone()
    }

    pub fn is(&self, node: NodeId, tag: &str) -> bool {
        self.nodes.borrow()[node.0].element.tag.eq_ignore_ascii_case(tag)
    }

    pub fn attribute(&self, node: NodeId, name: &str) -> Option<String> {
        self.nodes.borrow()[node.0]
            .element
            .attrs
            .get(&name.to_ascii_lowercase())
            .cloned()
    }

    /// Attribute value, treating an empty string the same as a missing attribute.
    pub fn non_empty_attribute(&self, node: NodeId, name: &str) -> Option<String> {
        self.attribute(node, name).filter(|v| !v.is_empty())
    }

    pub fn has_attribute(&self, node: NodeId, name: &str) -> bool {
        self.nodes.borrow()[node.0]
            .element
            .attrs
            .contains_key(&name.to_ascii_lowercase())
    }

    pub fn value(&self, node: NodeId) -> String {
        self.nodes.borrow()[node.0].element.value.clone()
    }

    pub fn checked(&self, node: NodeId) -> bool {
        self.nodes.borrow()[node.0].element.checked
    }

    pub fn files(&self, node: NodeId) -> Vec<FileBlob> {
        self.nodes.borrow()[node.0].element.files.clone()
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes.borrow()[node.0].parent
    }

    pub fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.nodes.borrow()[node.0].children.clone()
    }

    /// Ancestors from the parent up to the root.
    pub fn ancestors(&self, node: NodeId) -> Vec<NodeId> {
        let nodes = self.nodes.borrow();
        let mut out = Vec::new();
        let mut cursor = nodes[node.0].parent;
        while let Some(id) = cursor {
            out.push(id);
            cursor = nodes[id.0].parent;
        }
        out
    }

    /// Nearest inclusive ancestor matching `predicate`.
    pub fn closest(&self, node: NodeId, predicate: impl Fn(NodeId) -> bool) -> Option<NodeId> {
        std::iter::once(node)
            .chain(self.ancestors(node))
            .find(|&id| predicate(id))
    }

    pub fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        ancestor == node || self.ancestors(node).contains(&ancestor)
    }

    /// Descendants of `node` in document (pre-)order, excluding `node`.
    pub fn descendants(&self, node: NodeId) -> Vec<NodeId> {
        let nodes = self.nodes.borrow();
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = nodes[node.0].children.iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            out.push(id);
            stack.extend(nodes[id.0].children.iter().rev().copied());
        }
        out
    }

    /// Every element in document order, root first.
    pub fn document_order(&self) -> Vec<NodeId> {
        std::iter::once(self.root)
            .chain(self.descendants(self.root))
            .collect()
    }

    pub fn element_by_id(&self, id: &str) -> Option<NodeId> {
        self.document_order()
            .into_iter()
            .find(|&node| self.attribute(node, "id").as_deref() == Some(id))
    }

    /// Content of the first `meta[name=<name>]`.
    pub fn meta_content(&self, name: &str) -> Option<String> {
        self.document_order()
            .into_iter()
            .filter(|&node| self.is(node, "meta"))
            .find(|&node| self.attribute(node, "name").as_deref() == Some(name))
            .and_then(|node| self.attribute(node, "content"))
    }

    /// Human-readable label for diagnostics: `tag#id` or `tag`.
    pub fn node_label(&self, node: NodeId) -> String {
        match self.attribute(node, "id") {
            Some(id) => format!("{}#{}", self.tag_name(node), id),
            None => self.tag_name(node),
        }
    }

    // =========================================================================
    // Cookies
    // =========================================================================

    /// `document.cookie` style setter: `name=value`, replacing any cookie of
    /// the same name. Attributes after `;` are ignored.
    pub fn set_cookie(&self, cookie: &str) {
        let pair = cookie.split(';').next().unwrap_or("").trim();
        let (name, value) = match pair.split_once('=') {
            Some((name, value)) => (name.trim(), value),
            None => ("", pair),
        };

        let mut jar = self.cookie.borrow_mut();
        match jar.iter_mut().find(|(n, _)| n == name) {
            Some(entry) => entry.1 = value.to_string(),
            None => jar.push((name.to_string(), value.to_string())),
        }
    }

    /// `document.cookie` style getter: `a=1; b=2`.
    pub fn cookie(&self) -> String {
        self.cookie
            .borrow()
            .iter()
            .map(|(name, value)| format!("{}={}", name, value))
            .collect::<Vec<_>>()
            .join("; ")
    }

    // =========================================================================
    // Notifications
    // =========================================================================

    pub fn add_event_listener(&self, node: NodeId, kind: &str, listener: Rc<dyn Fn(&CustomEvent)>) {
        self.listeners
            .borrow_mut()
            .push((node, kind.to_string(), listener));
    }

    /// Record `event` in the event log and run listeners on the target, then
    /// on each ancestor when the event bubbles.
    pub fn dispatch_event(&self, event: CustomEvent) {
        let entry = LoggedEvent {
            kind: event.kind.clone(),
            target_id: self.attribute(event.target, "id"),
            detail: event.detail.clone(),
        };
        {
            let mut log = self.event_log.borrow_mut();
            if log.len() == EVENT_LOG_CAPACITY {
                log.pop_front();
            }
            log.push_back(entry);
        }

        let path: Vec<NodeId> = if event.bubbles {
            std::iter::once(event.target)
                .chain(self.ancestors(event.target))
                .collect()
        } else {
            vec![event.target]
        };

        for node in path {
            // Listeners may dispatch further events, so release the borrow first
            let matching: Vec<Rc<dyn Fn(&CustomEvent)>> = self
                .listeners
                .borrow()
                .iter()
                .filter(|(target, kind, _)| *target == node && *kind == event.kind)
                .map(|(_, _, listener)| Rc::clone(listener))
                .collect();

            for listener in matching {
                listener(&event);
            }
        }
    }

    /// Up to [`EVENT_LOG_CAPACITY`] notifications, oldest first.
    pub fn event_log(&self) -> Vec<LoggedEvent> {
        self.event_log.borrow().iter().cloned().collect()
    }

    pub fn take_event_log(&self) -> Vec<LoggedEvent> {
        self.event_log.borrow_mut().drain(..).collect()
    }
}
