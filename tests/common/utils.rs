use std::rc::Rc;

use frame_navigator::dom::document::{Document, NodeId};
use url::Url;

pub const PAGE_URL: &str = "https://example.com/posts/1";

pub fn url(s: &str) -> Url {
    Url::parse(s).unwrap()
}

/// Empty page at [`PAGE_URL`] with a `body`, returned with the body node.
pub fn page() -> (Rc<Document>, NodeId) {
    let document = Rc::new(Document::new(url(PAGE_URL)));
    let body = document.append_element(document.root(), "body", &[]);
    (document, body)
}

pub fn frame(document: &Document, parent: NodeId, id: &str) -> NodeId {
    document.append_element(parent, "turbo-frame", &[("id", id)])
}

pub fn form(document: &Document, parent: NodeId, attrs: &[(&str, &str)]) -> NodeId {
    document.append_element(parent, "form", attrs)
}

pub fn text_input(document: &Document, form: NodeId, name: &str, value: &str) -> NodeId {
    document.append_element(form, "input", &[("type", "text"), ("name", name), ("value", value)])
}

pub fn button(document: &Document, form: NodeId, attrs: &[(&str, &str)]) -> NodeId {
    let mut all = vec![("type", "submit")];
    all.extend_from_slice(attrs);
    document.append_element(form, "button", &all)
}

pub fn link(document: &Document, parent: NodeId, href: &str, attrs: &[(&str, &str)]) -> NodeId {
    let mut all = vec![("href", href)];
    all.extend_from_slice(attrs);
    document.append_element(parent, "a", &all)
}

/// Unique scratch path under the system temp dir.
pub fn temp_path(name: &str) -> String {
    let dir = std::env::temp_dir().join("frame_navigator_tests");
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join(format!("{}_{}", std::process::id(), name));
    let _ = std::fs::remove_file(&path);
    path.to_string_lossy().into_owned()
}
