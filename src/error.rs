use std::fmt;

#[derive(Debug)]
pub enum NavigatorError {
    /// Submission was requested for an element that is not a `<form>`
    NotAForm { element: String },

    /// Invoking control is not owned by the submitted form
    ForeignSubmitter { form: String, submitter: String },

    /// Action could not be expanded against the document base URL
    InvalidUrl { url: String, source: url::ParseError },

    /// Element lookup by id failed
    UnknownElement(String),

    /// Reading a page fixture or config file failed
    Io { path: String, source: std::io::Error },

    /// YAML parsing failed (page fixture or config)
    Yaml { context: String, source: serde_yaml::Error },
}

impl fmt::Display for NavigatorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NavigatorError::NotAForm { element } => {
                write!(f, "Element '{}' is not a form", element)
            }
            NavigatorError::ForeignSubmitter { form, submitter } => {
                write!(f, "Submitter '{}' does not belong to form '{}'", submitter, form)
            }
            NavigatorError::InvalidUrl { url, source } => {
                write!(f, "Invalid URL '{}': {}", url, source)
            }
            NavigatorError::UnknownElement(id) => {
                write!(f, "No element with id '{}'", id)
            }
            NavigatorError::Io { path, source } => {
                write!(f, "Failed to read {}: {}", path, source)
            }
            NavigatorError::Yaml { context, source } => {
                write!(f, "YAML parse error ({}): {}", context, source)
            }
        }
    }
}

impl std::error::Error for NavigatorError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            NavigatorError::InvalidUrl { source, .. } => Some(source),
            NavigatorError::Io { source, .. } => Some(source),
            NavigatorError::Yaml { source, .. } => Some(source),
            _ => None,
        }
    }
}
