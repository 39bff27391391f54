use std::collections::VecDeque;

use reqwest::blocking::{Client, multipart};
use reqwest::header::CONTENT_TYPE;
use tracing::{debug, warn};

use crate::http::fetch_request::{FetchBody, FetchError, FetchMethod, FetchRequest, FormValue};
use crate::http::fetch_response::FetchResponse;

/// Callback delivered by a transport. For one request the order is always
/// `Started`, then at most one `PreventedHandlingResponse`, then exactly one
/// of `Succeeded`/`Failed`/`Errored`, then `Finished`.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchEvent {
    Started,
    PreventedHandlingResponse(FetchResponse),
    Succeeded(FetchResponse),
    Failed(FetchResponse),
    Errored(FetchError),
    Finished,
}

impl FetchEvent {
    pub fn name(&self) -> &'static str {
        match self {
            FetchEvent::Started => "started",
            FetchEvent::PreventedHandlingResponse(_) => "prevented_handling_response",
            FetchEvent::Succeeded(_) => "succeeded",
            FetchEvent::Failed(_) => "failed",
            FetchEvent::Errored(_) => "errored",
            FetchEvent::Finished => "finished",
        }
    }
}

/// The fetch wrapper a submission runs on.
///
/// `perform` never blocks on the network: it only queues the request.
/// Progress is observed by draining `next_event` on later turns of the
/// event loop. `cancel` is only called after `perform` and is best effort:
/// the transport must still report a terminal outcome followed by
/// `Finished`, and an outcome already delivered stays the only one.
pub trait Transport {
    fn perform(&mut self, request: FetchRequest);
    fn cancel(&mut self);
    fn next_event(&mut self) -> Option<FetchEvent>;
}

pub trait TransportFactory {
    fn create(&self) -> Box<dyn Transport>;
}

// =========================================================================
// reqwest-backed transport
// =========================================================================

pub struct ReqwestTransport {
    client: Client,
    pending: Option<FetchRequest>,
    cancelled: bool,
    events: VecDeque<FetchEvent>,
}

impl ReqwestTransport {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            pending: None,
            cancelled: false,
            events: VecDeque::new(),
        }
    }

    fn execute(&self, request: &FetchRequest) -> Result<FetchResponse, FetchError> {
        let method = match request.method {
            FetchMethod::Get => reqwest::Method::GET,
            FetchMethod::Post => reqwest::Method::POST,
            FetchMethod::Put => reqwest::Method::PUT,
            FetchMethod::Patch => reqwest::Method::PATCH,
            FetchMethod::Delete => reqwest::Method::DELETE,
        };

        let mut builder = self.client.request(method, request.url.clone());
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        builder = match &request.body {
            None => builder,
            Some(FetchBody::Params(pairs)) => builder.form(pairs),
            Some(FetchBody::FormData(entries)) => {
                let mut form = multipart::Form::new();
                for entry in entries {
                    form = match &entry.value {
                        FormValue::Text(value) => form.text(entry.name.clone(), value.clone()),
                        FormValue::File(file) => {
                            let part = multipart::Part::bytes(file.bytes.clone())
                                .file_name(file.name.clone())
                                .mime_str(&file.content_type)
                                .map_err(|e| FetchError::InvalidBody(e.to_string()))?;
                            form.part(entry.name.clone(), part)
                        }
                    };
                }
                builder.multipart(form)
            }
        };

        let response = builder
            .send()
            .map_err(|e| FetchError::Network(e.to_string()))?;

        let location = response.url().clone();
        let redirected = location != request.url;
        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.to_string());
        let body = response
            .text()
            .map_err(|e| FetchError::Network(e.to_string()))?;

        let mut fetch_response = FetchResponse::new(status, location)
            .with_redirected(redirected)
            .with_body(&body);
        fetch_response.content_type = content_type;
        Ok(fetch_response)
    }
}

impl Transport for ReqwestTransport {
    fn perform(&mut self, request: FetchRequest) {
        if self.pending.is_some() || !self.events.is_empty() {
            warn!(url = %request.url, "transport already owns a request; ignoring perform");
            return;
        }
        debug!(method = %request.method, url = %request.url, "queueing request");
        self.pending = Some(request);
        self.events.push_back(FetchEvent::Started);
    }

    fn cancel(&mut self) {
        self.cancelled = true;
    }

    fn next_event(&mut self) -> Option<FetchEvent> {
        if let Some(event) = self.events.pop_front() {
            return Some(event);
        }

        let request = self.pending.take()?;
        let outcome = if self.cancelled {
            FetchEvent::Errored(FetchError::Aborted)
        } else {
            match self.execute(&request) {
                Ok(response) if response.succeeded() => FetchEvent::Succeeded(response),
                Ok(response) => FetchEvent::Failed(response),
                Err(e) => {
                    warn!(url = %request.url, error = %e, "request failed");
                    FetchEvent::Errored(e)
                }
            }
        };

        self.events.push_back(FetchEvent::Finished);
        Some(outcome)
    }
}

pub struct ReqwestTransportFactory {
    client: Client,
}

impl ReqwestTransportFactory {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

impl Default for ReqwestTransportFactory {
    fn default() -> Self {
        Self::new(Client::new())
    }
}

impl TransportFactory for ReqwestTransportFactory {
    fn create(&self) -> Box<dyn Transport> {
        Box::new(ReqwestTransport::new(self.client.clone()))
    }
}
