use serde::Serialize;
use url::Url;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FetchResponse {
    pub status: u16,
    /// Whether the transport followed at least one redirect.
    pub redirected: bool,
    /// Final URL after redirects.
    pub location: Url,
    pub content_type: Option<String>,
    #[serde(skip_serializing)]
    pub body: String,
}

impl FetchResponse {
    pub fn new(status: u16, location: Url) -> Self {
        Self {
            status,
            redirected: false,
            location,
            content_type: None,
            body: String::new(),
        }
    }

    pub fn with_redirected(mut self, redirected: bool) -> Self {
        self.redirected = redirected;
        self
    }

    pub fn with_content_type(mut self, content_type: &str) -> Self {
        self.content_type = Some(content_type.to_string());
        self
    }

    pub fn with_body(mut self, body: &str) -> Self {
        self.body = body.to_string();
        self
    }

    pub fn succeeded(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn failed(&self) -> bool {
        !self.succeeded()
    }

    pub fn client_error(&self) -> bool {
        (400..500).contains(&self.status)
    }

    pub fn server_error(&self) -> bool {
        (500..600).contains(&self.status)
    }

    pub fn is_html(&self) -> bool {
        self.content_type
            .as_deref()
            .map(|ct| ct.contains("text/html") || ct.contains("application/xhtml+xml"))
            .unwrap_or(false)
    }
}
