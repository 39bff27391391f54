use serde::Serialize;
use url::Url;

use crate::dom::document::{Document, NodeId};
use crate::error::NavigatorError;
use crate::http::fetch_request::{FetchBody, FetchMethod, FormEntry, FormValue};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FormEnctype {
    UrlEncoded,
    Multipart,
    Plain,
}

impl FormEnctype {
    /// Case-insensitive; unrecognized values fall back to url-encoded.
    pub fn parse(encoding: &str) -> Self {
        match encoding.to_ascii_lowercase().as_str() {
            "multipart/form-data" => FormEnctype::Multipart,
            "text/plain" => FormEnctype::Plain,
            _ => FormEnctype::UrlEncoded,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FormEnctype::UrlEncoded => "application/x-www-form-urlencoded",
            FormEnctype::Multipart => "multipart/form-data",
            FormEnctype::Plain => "text/plain",
        }
    }
}

/// Snapshot of a form submission intent.
///
/// Everything is read from the document once, in [`FormSubmission::new`];
/// editing the form afterwards does not change an existing submission.
#[derive(Debug, Clone, PartialEq)]
pub struct FormSubmission {
    form: NodeId,
    submitter: Option<NodeId>,
    method: FetchMethod,
    action: String,
    location: Url,
    enctype: FormEnctype,
    form_data: Vec<FormEntry>,
}

impl FormSubmission {
    pub fn new(
        document: &Document,
        form: NodeId,
        submitter: Option<NodeId>,
    ) -> Result<Self, NavigatorError> {
        if !document.is(form, "form") {
            return Err(NavigatorError::NotAForm {
                element: document.node_label(form),
            });
        }

        if let Some(control) = submitter {
            if form_owner(document, control) != Some(form) {
                return Err(NavigatorError::ForeignSubmitter {
                    form: document.node_label(form),
                    submitter: document.node_label(control),
                });
            }
        }

        let method = FetchMethod::parse(&raw_method(document, form, submitter))
            .unwrap_or(FetchMethod::Get);

        let action = submitter
            .and_then(|s| document.non_empty_attribute(s, "formaction"))
            .or_else(|| document.non_empty_attribute(form, "action"))
            .unwrap_or_else(|| document.url().to_string());

        let location = document
            .base_url()
            .join(&action)
            .map_err(|e| NavigatorError::InvalidUrl {
                url: action.clone(),
                source: e,
            })?;

        let enctype = FormEnctype::parse(
            &submitter
                .and_then(|s| document.non_empty_attribute(s, "formenctype"))
                .or_else(|| document.attribute(form, "enctype"))
                .unwrap_or_default(),
        );

        let form_data = build_form_data(document, form, submitter);

        Ok(Self {
            form,
            submitter,
            method,
            action,
            location,
            enctype,
            form_data,
        })
    }

    pub fn form(&self) -> NodeId {
        self.form
    }

    pub fn submitter(&self) -> Option<NodeId> {
        self.submitter
    }

    pub fn method(&self) -> FetchMethod {
        self.method
    }

    pub fn action(&self) -> &str {
        &self.action
    }

    pub fn location(&self) -> &Url {
        &self.location
    }

    pub fn enctype(&self) -> FormEnctype {
        self.enctype
    }

    pub fn form_data(&self) -> &[FormEntry] {
        &self.form_data
    }

    pub fn is_idempotent(&self) -> bool {
        self.method.is_idempotent()
    }

    /// GET and url-encoded submissions send string pairs only; everything
    /// else keeps the full entry list, files included.
    pub fn body(&self) -> FetchBody {
        if self.enctype == FormEnctype::UrlEncoded || self.method == FetchMethod::Get {
            FetchBody::Params(self.string_form_data())
        } else {
            FetchBody::FormData(self.form_data.clone())
        }
    }

    /// Stable identity for traces: SHA-1 over method, location and the
    /// url-encoded string entries.
    pub fn fingerprint(&self) -> String {
        use sha1::{Digest, Sha1};

        let mut hasher = Sha1::new();
        hasher.update(self.method.as_str().as_bytes());
        hasher.update(b" ");
        hasher.update(self.location.as_str().as_bytes());
        hasher.update(b"\n");
        hasher.update(FetchBody::Params(self.string_form_data()).to_urlencoded().as_bytes());
        format!("{:x}", hasher.finalize())
    }

    fn string_form_data(&self) -> Vec<(String, String)> {
        self.form_data
            .iter()
            .filter_map(|entry| {
                entry
                    .value
                    .as_text()
                    .map(|v| (entry.name.clone(), v.to_string()))
            })
            .collect()
    }
}

/// Method as written on the submitter or form, before validation.
/// Used by observers to skip `dialog` submissions.
pub fn raw_method(document: &Document, form: NodeId, submitter: Option<NodeId>) -> String {
    submitter
        .and_then(|s| document.non_empty_attribute(s, "formmethod"))
        .or_else(|| document.non_empty_attribute(form, "method"))
        .unwrap_or_default()
        .to_ascii_lowercase()
}

// =========================================================================
// Form owner and controls
// =========================================================================

const LISTED_CONTROLS: [&str; 4] = ["input", "select", "textarea", "button"];

/// Form that owns `control`: the form named by its `form` attribute, else the
/// nearest ancestor form.
pub fn form_owner(document: &Document, control: NodeId) -> Option<NodeId> {
    if let Some(form_id) = document.non_empty_attribute(control, "form") {
        return document
            .element_by_id(&form_id)
            .filter(|&node| document.is(node, "form"));
    }

    document
        .ancestors(control)
        .into_iter()
        .find(|&node| document.is(node, "form"))
}

/// Listed controls owned by `form`, in document order.
pub fn form_controls(document: &Document, form: NodeId) -> Vec<NodeId> {
    document
        .document_order()
        .into_iter()
        .filter(|&node| {
            let tag = document.tag_name(node);
            LISTED_CONTROLS.contains(&tag.as_str())
        })
        .filter(|&node| form_owner(document, node) == Some(form))
        .collect()
}

fn is_disabled(document: &Document, control: NodeId) -> bool {
    document.has_attribute(control, "disabled")
        || document
            .ancestors(control)
            .into_iter()
            .any(|node| document.is(node, "fieldset") && document.has_attribute(node, "disabled"))
}

fn input_type(document: &Document, control: NodeId) -> String {
    document
        .attribute(control, "type")
        .unwrap_or_else(|| "text".to_string())
        .to_ascii_lowercase()
}

fn build_form_data(document: &Document, form: NodeId, submitter: Option<NodeId>) -> Vec<FormEntry> {
    let mut entries = Vec::new();

    for control in form_controls(document, form) {
        if is_disabled(document, control) {
            continue;
        }

        let name = match document.non_empty_attribute(control, "name") {
            Some(name) => name,
            None => continue,
        };

        match document.tag_name(control).as_str() {
            "button" => continue,
            "select" => {
                for value in selected_values(document, control) {
                    entries.push(FormEntry::text(&name, &value));
                }
            }
            "textarea" => entries.push(FormEntry::text(&name, &document.value(control))),
            _ => match input_type(document, control).as_str() {
                "submit" | "button" | "reset" | "image" => continue,
                "checkbox" | "radio" => {
                    if document.checked(control) {
                        let value = document.value(control);
                        let value = if value.is_empty() { "on".to_string() } else { value };
                        entries.push(FormEntry::text(&name, &value));
                    }
                }
                "file" => {
                    for file in document.files(control) {
                        entries.push(FormEntry {
                            name: name.clone(),
                            value: FormValue::File(file),
                        });
                    }
                }
                _ => entries.push(FormEntry::text(&name, &document.value(control))),
            },
        }
    }

    // Several submit buttons may share a name and differ only by value
    if let Some(control) = submitter {
        let name = document.non_empty_attribute(control, "name");
        let value = document.attribute(control, "value");
        if let (Some(name), Some(value)) = (name, value) {
            let present = entries
                .iter()
                .any(|e| e.name == name && e.value.as_text() == Some(value.as_str()));
            if !present {
                entries.push(FormEntry::text(&name, &value));
            }
        }
    }

    entries
}

fn selected_values(document: &Document, select: NodeId) -> Vec<String> {
    let options: Vec<NodeId> = document
        .descendants(select)
        .into_iter()
        .filter(|&node| document.is(node, "option") && !document.has_attribute(node, "disabled"))
        .collect();

    let selected: Vec<String> = options
        .iter()
        .filter(|&&node| document.has_attribute(node, "selected"))
        .map(|&node| document.value(node))
        .collect();

    if selected.is_empty() && !document.has_attribute(select, "multiple") {
        options.first().map(|&node| document.value(node)).into_iter().collect()
    } else {
        selected
    }
}
