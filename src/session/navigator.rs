use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use tracing::{debug, info};
use url::Url;

use crate::dom::document::{Document, NodeId};
use crate::dom::event::{ClickEvent, SubmitEvent};
use crate::drive::form_submission::FormSubmission;
use crate::drive::submission_controller::{
    SubmissionController, SubmissionDelegate, SubmissionOptions, SubmissionState,
};
use crate::frames::frame_redirector::{FrameRedirector, RoutedNavigation, RoutingQueue};
use crate::frames::scope::Scope;
use crate::frames::target_resolver::{Destination, Resolution, ResolverConfig, TargetResolver};
use crate::http::transport::TransportFactory;
use crate::observers::interception::{InterceptionDelegate, InterceptionObserver, Intent};
use crate::trace::logger::TraceLogger;

#[derive(Debug, Clone, PartialEq)]
pub struct NavigatorConfig {
    pub submission: SubmissionOptions,
    /// Page-level (top) submissions must be answered with a redirect.
    pub page_must_redirect: bool,
    pub resolver: ResolverConfig,
    /// Take over navigations that are not inside any scope.
    pub drive_enabled: bool,
}

impl Default for NavigatorConfig {
    fn default() -> Self {
        Self {
            submission: SubmissionOptions::default(),
            page_must_redirect: true,
            resolver: ResolverConfig::default(),
            drive_enabled: true,
        }
    }
}

/// Receives link navigations; rendering and history are handled elsewhere.
pub trait NavigationDelegate {
    fn visit_proposed(&self, _url: &Url) {}
    fn scope_navigated(&self, _scope: &Scope, _url: &Url) {}
}

pub struct NavigatorDelegates {
    pub page: Rc<dyn SubmissionDelegate>,
    pub scope: Rc<dyn SubmissionDelegate>,
    pub navigation: Rc<dyn NavigationDelegate>,
}

/// Takes over the navigations the frame redirector left alone: elements
/// inside a scope stay there, elements at the root go to the page.
struct DriveInterceptor {
    document: Rc<Document>,
    resolver: TargetResolver,
    routes: RoutingQueue,
    enabled: bool,
}

impl DriveInterceptor {
    fn destination(&self, intent: &Intent) -> Option<Destination> {
        match self.resolver.resolve(&self.document, intent) {
            Resolution::Intercepted { destination, .. } => Some(destination),
            Resolution::NotIntercepted if self.enabled => Some(Destination::Top),
            Resolution::NotIntercepted => None,
        }
    }
}

impl InterceptionDelegate for DriveInterceptor {
    fn should_intercept(&self, intent: &Intent) -> bool {
        self.destination(intent).is_some()
    }

    fn intercepted(&self, intent: &Intent) {
        if let Some(destination) = self.destination(intent) {
            self.routes.borrow_mut().push_back(RoutedNavigation {
                intent: intent.clone(),
                destination,
                redirected: false,
            });
        }
    }
}

/// Page-level coordinator: observes events, routes intercepted navigations
/// and owns the submissions they start until they reach `Stopped`.
pub struct Navigator {
    document: Rc<Document>,
    config: NavigatorConfig,
    observer: InterceptionObserver,
    routes: RoutingQueue,
    transports: Box<dyn TransportFactory>,
    delegates: NavigatorDelegates,
    tracer: Option<Rc<TraceLogger>>,
    submissions: Vec<SubmissionController>,
}

impl Navigator {
    pub fn new(
        document: Rc<Document>,
        config: NavigatorConfig,
        transports: Box<dyn TransportFactory>,
        delegates: NavigatorDelegates,
    ) -> Self {
        let routes: RoutingQueue = Rc::new(RefCell::new(VecDeque::new()));
        let resolver = TargetResolver::new(config.resolver.clone());

        let mut observer = InterceptionObserver::new(Rc::clone(&document));
        observer.register(Rc::new(FrameRedirector::new(
            Rc::clone(&document),
            resolver.clone(),
            Rc::clone(&routes),
        )));
        observer.register(Rc::new(DriveInterceptor {
            document: Rc::clone(&document),
            resolver,
            routes: Rc::clone(&routes),
            enabled: config.drive_enabled,
        }));

        Self {
            document,
            config,
            observer,
            routes,
            transports,
            delegates,
            tracer: None,
            submissions: Vec::new(),
        }
    }

    pub fn with_tracer(mut self, tracer: Rc<TraceLogger>) -> Self {
        self.tracer = Some(tracer);
        self
    }

    pub fn document(&self) -> &Rc<Document> {
        &self.document
    }

    pub fn start(&mut self) {
        self.observer.start();
    }

    pub fn stop(&mut self) {
        self.observer.stop();
    }

    /// Submissions that have not finished yet.
    pub fn submissions(&self) -> &[SubmissionController] {
        &self.submissions
    }

    pub fn active_submissions(&self) -> usize {
        self.submissions.len()
    }

    // =========================================================================
    // Event entry points
    // =========================================================================

    /// Fire a submit event on `form` and return it so callers can inspect
    /// whether the default action was prevented.
    pub fn submit(&mut self, form: NodeId, submitter: Option<NodeId>) -> SubmitEvent {
        let event = SubmitEvent::new(form, submitter);
        self.dispatch_submit(&event);
        event
    }

    pub fn dispatch_submit(&mut self, event: &SubmitEvent) {
        self.observer.observe_submit(event);
        self.process_routes();
    }

    pub fn click(&mut self, target: NodeId) -> ClickEvent {
        let event = ClickEvent::primary(target);
        self.dispatch_click(&event);
        event
    }

    pub fn dispatch_click(&mut self, event: &ClickEvent) {
        self.observer.observe_click(event);
        self.process_routes();
    }

    // =========================================================================
    // Event loop
    // =========================================================================

    /// Deliver at most one transport event to each live submission, then
    /// release the ones that finished. Returns `false` when nothing happened.
    pub fn pump(&mut self) -> bool {
        let mut progressed = false;
        for submission in self.submissions.iter_mut() {
            progressed |= submission.pump();
        }
        self.release_finished();
        progressed
    }

    pub fn run_until_idle(&mut self) {
        while self.pump() {}
    }

    /// Cancel every live submission.
    pub fn stop_submissions(&mut self) -> usize {
        let stopped = self
            .submissions
            .iter_mut()
            .map(|s| s.stop())
            .filter(|stopped| *stopped)
            .count();
        self.release_finished();
        stopped
    }

    fn release_finished(&mut self) {
        let before = self.submissions.len();
        self.submissions.retain(|s| s.state() != SubmissionState::Stopped);
        let released = before - self.submissions.len();
        if released > 0 {
            debug!(released, live = self.submissions.len(), "released finished submissions");
        }
    }

    fn process_routes(&mut self) {
        loop {
            let next = self.routes.borrow_mut().pop_front();
            let Some(route) = next else { break };

            match route.intent {
                Intent::Form { submission } => self.start_submission(submission, &route.destination),
                Intent::Link { url, .. } => self.follow_link(&url, &route.destination),
            }
        }
    }

    fn start_submission(&mut self, submission: FormSubmission, destination: &Destination) {
        let mut options = self.config.submission.clone();
        let delegate = match destination {
            Destination::Top => {
                options.must_redirect = self.config.page_must_redirect;
                Rc::clone(&self.delegates.page)
            }
            Destination::Scope(scope) => {
                self.document.remove_attribute(scope.element, "reloadable");
                options.must_redirect = false;
                Rc::clone(&self.delegates.scope)
            }
        };

        let mut controller = SubmissionController::new(
            Rc::clone(&self.document),
            submission,
            delegate,
            self.transports.create(),
            options,
        );
        if let Some(tracer) = &self.tracer {
            controller = controller.with_tracer(Rc::clone(tracer));
        }

        info!(method = %controller.method(), url = %controller.location(), "submitting form");
        controller.start();
        self.submissions.push(controller);
    }

    fn follow_link(&mut self, url: &Url, destination: &Destination) {
        match destination {
            Destination::Top => {
                debug!(url = %url, "proposing page visit");
                self.delegates.navigation.visit_proposed(url);
            }
            Destination::Scope(scope) => {
                debug!(scope = %scope.id, url = %url, "loading scope");
                self.document.set_attribute(scope.element, "reloadable", "");
                self.document.set_attribute(scope.element, "src", url.as_str());
                self.delegates.navigation.scope_navigated(scope, url);
            }
        }
    }
}
