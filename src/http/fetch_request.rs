use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::dom::document::{FileBlob, NodeId};

/// Default `Accept` header sent with every request.
pub const DEFAULT_ACCEPT: &str = "text/html, application/xhtml+xml";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FetchMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl FetchMethod {
    /// Case-insensitive parse; `None` for anything outside the supported set.
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "get" => Some(FetchMethod::Get),
            "post" => Some(FetchMethod::Post),
            "put" => Some(FetchMethod::Put),
            "patch" => Some(FetchMethod::Patch),
            "delete" => Some(FetchMethod::Delete),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FetchMethod::Get => "GET",
            FetchMethod::Post => "POST",
            FetchMethod::Put => "PUT",
            FetchMethod::Patch => "PATCH",
            FetchMethod::Delete => "DELETE",
        }
    }

    pub fn is_idempotent(self) -> bool {
        self == FetchMethod::Get
    }
}

impl fmt::Display for FetchMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum FormValue {
    Text(String),
    File(FileBlob),
}

impl FormValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FormValue::Text(s) => Some(s),
            FormValue::File(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FormEntry {
    pub name: String,
    pub value: FormValue,
}

impl FormEntry {
    pub fn text(name: &str, value: &str) -> Self {
        Self {
            name: name.to_string(),
            value: FormValue::Text(value.to_string()),
        }
    }
}

/// Request body: either flattened string pairs or the full entry list
/// (which may carry files and is sent as `multipart/form-data`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "entries", rename_all = "snake_case")]
pub enum FetchBody {
    Params(Vec<(String, String)>),
    FormData(Vec<FormEntry>),
}

impl FetchBody {
    pub fn params(&self) -> Option<&[(String, String)]> {
        match self {
            FetchBody::Params(pairs) => Some(pairs),
            FetchBody::FormData(_) => None,
        }
    }

    /// `application/x-www-form-urlencoded` rendering. File entries are skipped.
    pub fn to_urlencoded(&self) -> String {
        let mut serializer = url::form_urlencoded::Serializer::new(String::new());
        match self {
            FetchBody::Params(pairs) => {
                for (name, value) in pairs {
                    serializer.append_pair(name, value);
                }
            }
            FetchBody::FormData(entries) => {
                for entry in entries {
                    if let Some(value) = entry.value.as_text() {
                        serializer.append_pair(&entry.name, value);
                    }
                }
            }
        }
        serializer.finish()
    }
}

pub type FetchRequestHeaders = BTreeMap<String, String>;

/// A request ready to hand to a [`Transport`](crate::http::transport::Transport).
#[derive(Debug, Clone, PartialEq)]
pub struct FetchRequest {
    pub method: FetchMethod,
    pub url: Url,
    pub body: Option<FetchBody>,
    pub headers: FetchRequestHeaders,
    pub target: Option<NodeId>,
}

impl FetchRequest {
    /// GET requests carry their params in the query string and have no body.
    pub fn new(method: FetchMethod, location: &Url, body: FetchBody, target: Option<NodeId>) -> Self {
        let mut headers = FetchRequestHeaders::new();
        headers.insert("Accept".into(), DEFAULT_ACCEPT.into());

        let mut url = location.clone();
        let body = if method == FetchMethod::Get {
            merge_query_params(&mut url, &body);
            None
        } else {
            Some(body)
        };

        Self {
            method,
            url,
            body,
            headers,
            target,
        }
    }

    pub fn is_idempotent(&self) -> bool {
        self.method.is_idempotent()
    }
}

/// Replace query params that share a name with a body entry, append the rest.
fn merge_query_params(url: &mut Url, body: &FetchBody) {
    let entries: Vec<(String, String)> = match body {
        FetchBody::Params(pairs) => pairs.clone(),
        FetchBody::FormData(entries) => entries
            .iter()
            .filter_map(|e| e.value.as_text().map(|v| (e.name.clone(), v.to_string())))
            .collect(),
    };

    if entries.is_empty() {
        return;
    }

    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(name, _)| !entries.iter().any(|(n, _)| n == name))
        .map(|(n, v)| (n.into_owned(), v.into_owned()))
        .collect();

    let mut query = url.query_pairs_mut();
    query.clear();
    for (name, value) in kept.iter().chain(entries.iter()) {
        query.append_pair(name, value);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// Connection, DNS or protocol failure reported by the transport
    Network(String),

    /// Request was cancelled before a response arrived
    Aborted,

    /// Non-idempotent submission answered with a plain 200
    MissingRedirect,

    /// Body could not be encoded for the wire
    InvalidBody(String),
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchError::Network(msg) => write!(f, "Network error: {}", msg),
            FetchError::Aborted => write!(f, "Request aborted"),
            FetchError::MissingRedirect => {
                write!(f, "Form responses must redirect to another location")
            }
            FetchError::InvalidBody(msg) => write!(f, "Invalid request body: {}", msg),
        }
    }
}

impl std::error::Error for FetchError {}
