use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::dom::document::{Document, FileBlob, NodeId};
use crate::error::NavigatorError;

/// A page described in YAML, used by the CLI and by tests to build a
/// [`Document`] without an HTML parser.
///
/// ```yaml
/// url: https://example.com/posts
/// cookies: ["csrf-token=abc%20def"]
/// meta:
///   csrf-token: fallback
/// body:
///   - tag: turbo-frame
///     attrs: { id: comments }
///     children:
///       - tag: form
///         attrs: { id: new-comment, method: post, action: /comments }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PageFixture {
    pub url: String,

    #[serde(default)]
    pub cookies: Vec<String>,

    #[serde(default)]
    pub meta: BTreeMap<String, String>,

    #[serde(default)]
    pub body: Vec<NodeFixture>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NodeFixture {
    pub tag: String,

    #[serde(default)]
    pub attrs: BTreeMap<String, String>,

    #[serde(default)]
    pub files: Vec<FileFixture>,

    #[serde(default)]
    pub children: Vec<NodeFixture>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FileFixture {
    pub name: String,

    #[serde(default = "default_content_type")]
    pub content_type: String,

    #[serde(default)]
    pub content: String,
}

fn default_content_type() -> String {
    "application/octet-stream".to_string()
}

impl PageFixture {
    pub fn from_yaml_str(yaml: &str) -> Result<Self, NavigatorError> {
        serde_yaml::from_str(yaml).map_err(|e| NavigatorError::Yaml {
            context: "page fixture".into(),
            source: e,
        })
    }

    pub fn load(path: &str) -> Result<Self, NavigatorError> {
        let content = std::fs::read_to_string(path).map_err(|e| NavigatorError::Io {
            path: path.to_string(),
            source: e,
        })?;
        Self::from_yaml_str(&content)
    }

    /// Build the document: `html > head > meta*` followed by `html > body > ...`.
    pub fn to_document(&self) -> Result<Document, NavigatorError> {
        let url = Url::parse(&self.url).map_err(|e| NavigatorError::InvalidUrl {
            url: self.url.clone(),
            source: e,
        })?;

        let document = Document::new(url);
        let head = document.append_element(document.root(), "head", &[]);
        for (name, content) in &self.meta {
            document.append_element(head, "meta", &[("name", name), ("content", content)]);
        }

        let body = document.append_element(document.root(), "body", &[]);
        for node in &self.body {
            append_fixture(&document, body, node);
        }

        for cookie in &self.cookies {
            document.set_cookie(cookie);
        }

        Ok(document)
    }
}

fn append_fixture(document: &Document, parent: NodeId, fixture: &NodeFixture) {
    let attrs: Vec<(&str, &str)> = fixture
        .attrs
        .iter()
        .map(|(k, v)| (k.as_str(), v.as_str()))
        .collect();
    let node = document.append_element(parent, &fixture.tag, &attrs);

    for file in &fixture.files {
        document.attach_file(
            node,
            FileBlob {
                name: file.name.clone(),
                content_type: file.content_type.clone(),
                bytes: file.content.as_bytes().to_vec(),
            },
        );
    }

    for child in &fixture.children {
        append_fixture(document, node, child);
    }
}
