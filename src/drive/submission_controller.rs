use std::rc::Rc;

use serde::Serialize;
use serde_json::{Value, json};
use tracing::debug;
use url::Url;

use crate::dom::document::{Document, NodeId};
use crate::dom::event::CustomEvent;
use crate::drive::csrf::{CSRF_HEADER, CsrfConfig};
use crate::drive::form_submission::{FormEnctype, FormSubmission};
use crate::http::fetch_request::{
    FetchBody, FetchError, FetchMethod, FetchRequest, FetchRequestHeaders,
};
use crate::http::fetch_response::FetchResponse;
use crate::http::transport::{FetchEvent, Transport};
use crate::trace::{logger::TraceLogger, trace::TraceEvent};

pub const SUBMIT_START_EVENT: &str = "submit-start";
pub const SUBMIT_END_EVENT: &str = "submit-end";

/// Content type servers may answer with to stream partial updates.
pub const STREAM_CONTENT_TYPE: &str = "text/vnd.turbo-stream.html";

/// Receives lifecycle callbacks for a submission. Per submission the order is
/// started, one of succeeded/failed/errored, then finished. A submission
/// stopped before it started skips `submission_started`.
pub trait SubmissionDelegate {
    fn submission_started(&self, submission: &SubmissionController);
    fn submission_succeeded(&self, submission: &SubmissionController, response: &FetchResponse);
    fn submission_failed(&self, submission: &SubmissionController, response: &FetchResponse);
    fn submission_errored(&self, submission: &SubmissionController, error: &FetchError);
    fn submission_finished(&self, submission: &SubmissionController);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SubmissionState {
    Initialized,
    Requesting,
    Waiting,
    Receiving,
    Stopping,
    Stopped,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SubmissionResult {
    Response { success: bool, response: FetchResponse },
    Error(FetchError),
}

impl SubmissionResult {
    pub fn success(&self) -> bool {
        matches!(self, SubmissionResult::Response { success: true, .. })
    }

    pub fn response(&self) -> Option<&FetchResponse> {
        match self {
            SubmissionResult::Response { response, .. } => Some(response),
            SubmissionResult::Error(_) => None,
        }
    }

    pub fn error(&self) -> Option<&FetchError> {
        match self {
            SubmissionResult::Error(e) => Some(e),
            SubmissionResult::Response { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SubmissionOptions {
    pub csrf: CsrfConfig,
    /// Non-idempotent submissions must be answered with a redirect.
    pub must_redirect: bool,
    pub stream_content_type: String,
}

impl Default for SubmissionOptions {
    fn default() -> Self {
        Self {
            csrf: CsrfConfig::default(),
            must_redirect: false,
            stream_content_type: STREAM_CONTENT_TYPE.to_string(),
        }
    }
}

/// Drives one [`FormSubmission`] through a single network request.
///
/// `start` hands the request to the transport; every later transition comes
/// from a [`FetchEvent`] fed through [`handle_event`](Self::handle_event)
/// (or pulled from the transport with [`pump`](Self::pump)). `Stopped` is
/// terminal and only `request_finished` enters it.
pub struct SubmissionController {
    document: Rc<Document>,
    submission: FormSubmission,
    delegate: Rc<dyn SubmissionDelegate>,
    transport: Box<dyn Transport>,
    options: SubmissionOptions,
    state: SubmissionState,
    result: Option<SubmissionResult>,
    fingerprint: String,
    tracer: Option<Rc<TraceLogger>>,
}

impl SubmissionController {
    pub fn new(
        document: Rc<Document>,
        submission: FormSubmission,
        delegate: Rc<dyn SubmissionDelegate>,
        transport: Box<dyn Transport>,
        options: SubmissionOptions,
    ) -> Self {
        let fingerprint = submission.fingerprint();
        Self {
            document,
            submission,
            delegate,
            transport,
            options,
            state: SubmissionState::Initialized,
            result: None,
            fingerprint,
            tracer: None,
        }
    }

    pub fn with_tracer(mut self, tracer: Rc<TraceLogger>) -> Self {
        self.tracer = Some(tracer);
        self
    }

    pub fn state(&self) -> SubmissionState {
        self.state
    }

    pub fn result(&self) -> Option<&SubmissionResult> {
        self.result.as_ref()
    }

    pub fn submission(&self) -> &FormSubmission {
        &self.submission
    }

    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    pub fn options(&self) -> &SubmissionOptions {
        &self.options
    }

    pub fn method(&self) -> FetchMethod {
        self.submission.method()
    }

    pub fn location(&self) -> &Url {
        self.submission.location()
    }

    pub fn action(&self) -> &str {
        self.submission.action()
    }

    pub fn enctype(&self) -> FormEnctype {
        self.submission.enctype()
    }

    pub fn body(&self) -> FetchBody {
        self.submission.body()
    }

    pub fn form(&self) -> NodeId {
        self.submission.form()
    }

    pub fn submitter(&self) -> Option<NodeId> {
        self.submission.submitter()
    }

    pub fn is_idempotent(&self) -> bool {
        self.submission.is_idempotent()
    }

    // =========================================================================
    // The submission process
    // =========================================================================

    /// Build the request and hand it to the transport. Only the first call
    /// from `Initialized` does anything.
    pub fn start(&mut self) -> bool {
        if self.state != SubmissionState::Initialized {
            debug!(submission = %self.fingerprint, state = ?self.state, "start ignored");
            return false;
        }

        self.state = SubmissionState::Requesting;

        let mut request = FetchRequest::new(
            self.method(),
            self.location(),
            self.body(),
            Some(self.form()),
        );
        let mut headers = request.headers.clone();
        self.prepare_headers_for_request(&mut headers, &request);
        request.headers = headers;

        debug!(submission = %self.fingerprint, method = %request.method, url = %request.url, "performing request");
        self.trace(TraceEvent::now(&self.fingerprint, self.state, "start")
            .with_request(request.method, &request.url));

        self.transport.perform(request);
        true
    }

    /// Ask the transport to abort. The controller still waits for the
    /// transport's terminal callbacks before reaching `Stopped`. A submission
    /// that never started has no request to abort and finishes right away.
    pub fn stop(&mut self) -> bool {
        match self.state {
            SubmissionState::Stopping | SubmissionState::Stopped => false,
            SubmissionState::Initialized => {
                self.state = SubmissionState::Stopping;
                debug!(submission = %self.fingerprint, "submission stopped before start");
                self.trace(TraceEvent::now(&self.fingerprint, self.state, "stop"));
                self.request_errored(FetchError::Aborted);
                self.request_finished();
                true
            }
            _ => {
                self.state = SubmissionState::Stopping;
                self.transport.cancel();
                debug!(submission = %self.fingerprint, "submission stopping");
                self.trace(TraceEvent::now(&self.fingerprint, self.state, "stop"));
                true
            }
        }
    }

    /// Pull one event from the transport. Returns `false` when none is ready.
    pub fn pump(&mut self) -> bool {
        match self.transport.next_event() {
            Some(event) => {
                self.handle_event(event);
                true
            }
            None => false,
        }
    }

    /// Pump until `Stopped` or the transport runs dry.
    pub fn run_to_completion(&mut self) {
        while self.state != SubmissionState::Stopped && self.pump() {}
    }

    pub fn handle_event(&mut self, event: FetchEvent) {
        if self.state == SubmissionState::Stopped {
            debug!(submission = %self.fingerprint, event = event.name(), "event after finish ignored");
            return;
        }

        match event {
            FetchEvent::Started => self.request_started(),
            FetchEvent::PreventedHandlingResponse(response) => {
                self.request_prevented_handling_response(response)
            }
            FetchEvent::Succeeded(response) => self.request_succeeded_with_response(response),
            FetchEvent::Failed(response) => self.request_failed_with_response(response),
            FetchEvent::Errored(error) => self.request_errored(error),
            FetchEvent::Finished => self.request_finished(),
        }
    }

    // =========================================================================
    // Fetch request delegate
    // =========================================================================

    /// Non-idempotent requests get the CSRF token and advertise the stream
    /// content type ahead of the existing `Accept` value.
    pub fn prepare_headers_for_request(&self, headers: &mut FetchRequestHeaders, request: &FetchRequest) {
        if request.is_idempotent() {
            return;
        }

        if let Some(token) = self.options.csrf.token(&self.document.cookie()) {
            headers.insert(CSRF_HEADER.to_string(), token);
        }

        let accept = match headers.get("Accept") {
            Some(existing) if !existing.is_empty() => {
                format!("{}, {}", self.options.stream_content_type, existing)
            }
            _ => self.options.stream_content_type.clone(),
        };
        headers.insert("Accept".to_string(), accept);
    }

    pub fn request_started(&mut self) {
        if self.state != SubmissionState::Stopping {
            self.state = SubmissionState::Waiting;
        }
        self.trace(TraceEvent::now(&self.fingerprint, self.state, "started"));

        self.document.dispatch_event(CustomEvent::bubbling(
            SUBMIT_START_EVENT,
            self.form(),
            json!({ "submission": self.summary() }),
        ));

        let delegate = Rc::clone(&self.delegate);
        delegate.submission_started(self);
    }

    /// Another party consumed the response; remember the outcome only.
    pub fn request_prevented_handling_response(&mut self, response: FetchResponse) {
        self.result = Some(SubmissionResult::Response {
            success: response.succeeded(),
            response,
        });
    }

    pub fn request_succeeded_with_response(&mut self, response: FetchResponse) {
        let delegate = Rc::clone(&self.delegate);

        if response.client_error() || response.server_error() {
            self.trace(TraceEvent::now(&self.fingerprint, self.state, "failed").with_status(response.status));
            self.result = Some(SubmissionResult::Response {
                success: false,
                response: response.clone(),
            });
            delegate.submission_failed(self, &response);
        } else if self.request_must_redirect() && succeeded_without_redirect(&response) {
            let error = FetchError::MissingRedirect;
            self.trace(TraceEvent::now(&self.fingerprint, self.state, "errored").with_error(&error));
            self.result = Some(SubmissionResult::Error(error.clone()));
            delegate.submission_errored(self, &error);
        } else {
            if self.state != SubmissionState::Stopping {
                self.state = SubmissionState::Receiving;
            }
            self.trace(TraceEvent::now(&self.fingerprint, self.state, "succeeded").with_status(response.status));
            self.result = Some(SubmissionResult::Response {
                success: true,
                response: response.clone(),
            });
            delegate.submission_succeeded(self, &response);
        }
    }

    pub fn request_failed_with_response(&mut self, response: FetchResponse) {
        self.trace(TraceEvent::now(&self.fingerprint, self.state, "failed").with_status(response.status));
        self.result = Some(SubmissionResult::Response {
            success: false,
            response: response.clone(),
        });

        let delegate = Rc::clone(&self.delegate);
        delegate.submission_failed(self, &response);
    }

    pub fn request_errored(&mut self, error: FetchError) {
        self.trace(TraceEvent::now(&self.fingerprint, self.state, "errored").with_error(&error));
        self.result = Some(SubmissionResult::Error(error.clone()));

        let delegate = Rc::clone(&self.delegate);
        delegate.submission_errored(self, &error);
    }

    pub fn request_finished(&mut self) {
        self.state = SubmissionState::Stopped;
        self.trace(TraceEvent::now(&self.fingerprint, self.state, "finished"));

        let mut detail = json!({ "submission": self.summary() });
        if let (Some(result), Value::Object(map)) = (&self.result, &mut detail) {
            map.insert("success".into(), Value::Bool(result.success()));
            if let Some(response) = result.response() {
                map.insert("fetch_response".into(), json!(response));
            }
            if let Some(error) = result.error() {
                map.insert("error".into(), Value::String(error.to_string()));
            }
        }
        self.document
            .dispatch_event(CustomEvent::bubbling(SUBMIT_END_EVENT, self.form(), detail));

        let delegate = Rc::clone(&self.delegate);
        delegate.submission_finished(self);
    }

    pub fn request_must_redirect(&self) -> bool {
        !self.is_idempotent() && self.options.must_redirect
    }

    fn summary(&self) -> Value {
        json!({
            "fingerprint": self.fingerprint,
            "method": self.method(),
            "action": self.action(),
            "location": self.location().as_str(),
            "enctype": self.enctype().as_str(),
            "state": self.state,
        })
    }

    fn trace(&self, event: TraceEvent) {
        if let Some(tracer) = &self.tracer {
            tracer.log(&event);
        }
    }
}

fn succeeded_without_redirect(response: &FetchResponse) -> bool {
    response.status == 200 && !response.redirected
}
