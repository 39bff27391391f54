use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use frame_navigator::drive::submission_controller::{
    SubmissionController, SubmissionDelegate, SubmissionState,
};
use frame_navigator::frames::scope::Scope;
use frame_navigator::http::fetch_request::{FetchError, FetchRequest};
use frame_navigator::http::fetch_response::FetchResponse;
use frame_navigator::http::transport::{FetchEvent, Transport, TransportFactory};
use frame_navigator::session::navigator::NavigationDelegate;
use url::Url;

// =========================================================================
// Scripted transport
// =========================================================================

/// What the transports built by one factory saw.
#[derive(Debug, Default)]
pub struct TransportLog {
    pub requests: Vec<FetchRequest>,
    pub cancels: usize,
}

pub type SharedLog = Rc<RefCell<TransportLog>>;

/// Replays `Started` followed by a fixed script once `perform` is called.
/// Like the reqwest transport, `cancel` turns an outcome that has not been
/// delivered yet into an abort and leaves a delivered one alone.
pub struct ScriptedTransport {
    script: Vec<FetchEvent>,
    events: VecDeque<FetchEvent>,
    performed: bool,
    settled: bool,
    log: SharedLog,
}

impl ScriptedTransport {
    pub fn new(script: Vec<FetchEvent>) -> (Self, SharedLog) {
        let log = SharedLog::default();
        (Self::with_log(script, Rc::clone(&log)), log)
    }

    pub fn with_log(script: Vec<FetchEvent>, log: SharedLog) -> Self {
        Self {
            script,
            events: VecDeque::new(),
            performed: false,
            settled: false,
            log,
        }
    }

    /// `Started`, `Succeeded(response)`, `Finished`.
    pub fn responding(response: FetchResponse) -> (Self, SharedLog) {
        Self::new(vec![FetchEvent::Succeeded(response), FetchEvent::Finished])
    }
}

impl Transport for ScriptedTransport {
    fn perform(&mut self, request: FetchRequest) {
        self.log.borrow_mut().requests.push(request);
        self.performed = true;
        self.events.push_back(FetchEvent::Started);
        self.events.extend(self.script.drain(..));
    }

    fn cancel(&mut self) {
        self.log.borrow_mut().cancels += 1;
        if !self.performed || self.settled {
            return;
        }
        let started = matches!(self.events.front(), Some(FetchEvent::Started));
        self.events.clear();
        self.script.clear();
        if started {
            self.events.push_back(FetchEvent::Started);
        }
        self.events.push_back(FetchEvent::Errored(FetchError::Aborted));
        self.events.push_back(FetchEvent::Finished);
    }

    fn next_event(&mut self) -> Option<FetchEvent> {
        let event = self.events.pop_front()?;
        if matches!(event, FetchEvent::Succeeded(_) | FetchEvent::Failed(_) | FetchEvent::Errored(_)) {
            self.settled = true;
        }
        Some(event)
    }
}

/// Hands every new transport the same script and a shared log.
pub struct ScriptedFactory {
    pub script: Vec<FetchEvent>,
    pub log: SharedLog,
}

impl ScriptedFactory {
    pub fn new(script: Vec<FetchEvent>) -> (Self, SharedLog) {
        let log = SharedLog::default();
        (
            Self {
                script,
                log: Rc::clone(&log),
            },
            log,
        )
    }
}

impl TransportFactory for ScriptedFactory {
    fn create(&self) -> Box<dyn Transport> {
        Box::new(ScriptedTransport::with_log(self.script.clone(), Rc::clone(&self.log)))
    }
}

// =========================================================================
// Recording delegate
// =========================================================================

/// Records callbacks as short strings, e.g. `started:Waiting`,
/// `succeeded:303`, `errored:Aborted`, `finished:Stopped`.
#[derive(Default)]
pub struct RecordingDelegate {
    pub calls: RefCell<Vec<String>>,
    pub visits: RefCell<Vec<Url>>,
    pub scope_loads: RefCell<Vec<(String, Url)>>,
}

impl RecordingDelegate {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    fn record(&self, call: String) {
        self.calls.borrow_mut().push(call);
    }
}

fn state_name(state: SubmissionState) -> String {
    format!("{:?}", state)
}

impl SubmissionDelegate for RecordingDelegate {
    fn submission_started(&self, submission: &SubmissionController) {
        self.record(format!("started:{}", state_name(submission.state())));
    }

    fn submission_succeeded(&self, _submission: &SubmissionController, response: &FetchResponse) {
        self.record(format!("succeeded:{}", response.status));
    }

    fn submission_failed(&self, _submission: &SubmissionController, response: &FetchResponse) {
        self.record(format!("failed:{}", response.status));
    }

    fn submission_errored(&self, _submission: &SubmissionController, error: &FetchError) {
        self.record(format!("errored:{:?}", error));
    }

    fn submission_finished(&self, submission: &SubmissionController) {
        self.record(format!("finished:{}", state_name(submission.state())));
    }
}

impl NavigationDelegate for RecordingDelegate {
    fn visit_proposed(&self, url: &Url) {
        self.visits.borrow_mut().push(url.clone());
    }

    fn scope_navigated(&self, scope: &Scope, url: &Url) {
        self.scope_loads.borrow_mut().push((scope.id.clone(), url.clone()));
    }
}
