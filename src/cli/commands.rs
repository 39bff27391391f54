use std::cell::Cell;
use std::rc::Rc;

use url::Url;

use crate::cli::config::{AppConfig, build_navigator_config};
use crate::dom::document::{Document, NodeId};
use crate::dom::fixture::PageFixture;
use crate::drive::form_submission::FormSubmission;
use crate::drive::submission_controller::{SubmissionController, SubmissionDelegate};
use crate::error::NavigatorError;
use crate::frames::scope::Scope;
use crate::frames::target_resolver::{Destination, EscapePolicy, Resolution, TargetResolver};
use crate::http::fetch_request::FetchError;
use crate::http::fetch_response::FetchResponse;
use crate::http::transport::ReqwestTransportFactory;
use crate::observers::interception::Intent;
use crate::session::navigator::{NavigationDelegate, Navigator, NavigatorDelegates};
use crate::trace::logger::TraceLogger;

// ============================================================================
// resolve subcommand
// ============================================================================

pub fn cmd_resolve(
    page: &str,
    element: &str,
    submitter: Option<&str>,
    get_policy: Option<EscapePolicy>,
    config: &AppConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let document = PageFixture::load(page)?.to_document()?;
    let navigator_config = build_navigator_config(config, get_policy);
    let resolver = TargetResolver::new(navigator_config.resolver);

    let resolution = resolve_element(&document, &resolver, element, submitter)?;
    println!("{}", describe_resolution(&resolution));
    Ok(())
}

/// Build the intent for the element with id `element` (a link or a form) and
/// resolve it.
pub fn resolve_element(
    document: &Document,
    resolver: &TargetResolver,
    element: &str,
    submitter: Option<&str>,
) -> Result<Resolution, NavigatorError> {
    let node = find_element(document, element)?;
    let intent = if document.is(node, "form") {
        let control = submitter.map(|id| find_element(document, id)).transpose()?;
        Intent::Form {
            submission: FormSubmission::new(document, node, control)?,
        }
    } else {
        let href = document.attribute(node, "href").unwrap_or_default();
        let url = document
            .base_url()
            .join(&href)
            .map_err(|e| NavigatorError::InvalidUrl { url: href, source: e })?;
        Intent::Link { element: node, url }
    };

    Ok(resolver.resolve(document, &intent))
}

pub fn describe_resolution(resolution: &Resolution) -> String {
    match resolution {
        Resolution::NotIntercepted => "not intercepted".to_string(),
        Resolution::Intercepted { destination, redirected } => {
            let target = match destination {
                Destination::Top => "page".to_string(),
                Destination::Scope(scope) => format!("scope '{}'", scope.id),
            };
            if *redirected {
                format!("intercepted -> {} (redirected)", target)
            } else {
                format!("intercepted -> {}", target)
            }
        }
    }
}

// ============================================================================
// submit subcommand
// ============================================================================

/// Submit a form over HTTP and return whether the submission succeeded.
pub fn cmd_submit(
    page: &str,
    form: &str,
    submitter: Option<&str>,
    trace: Option<&str>,
    config: &AppConfig,
) -> Result<bool, Box<dyn std::error::Error>> {
    let document = Rc::new(PageFixture::load(page)?.to_document()?);
    let form = find_element(&document, form)?;
    let control = submitter.map(|id| find_element(&document, id)).transpose()?;

    let mut navigator_config = build_navigator_config(config, None);
    navigator_config.submission.csrf = navigator_config
        .submission
        .csrf
        .clone()
        .with_document_defaults(&document);

    let console = Rc::new(ConsoleDelegate::default());
    let delegates = NavigatorDelegates {
        page: console.clone(),
        scope: console.clone(),
        navigation: console.clone(),
    };

    let mut navigator = Navigator::new(
        Rc::clone(&document),
        navigator_config,
        Box::new(ReqwestTransportFactory::default()),
        delegates,
    );
    if let Some(path) = trace.or(config.trace.path.as_deref()) {
        navigator = navigator.with_tracer(Rc::new(TraceLogger::new(path)));
    }

    navigator.start();
    let event = navigator.submit(form, control);
    if !event.flags.default_prevented() {
        println!("submission left to the browser");
        return Ok(false);
    }
    navigator.run_until_idle();

    for entry in document.take_event_log() {
        println!(
            "event {} on {}: {}",
            entry.kind,
            entry.target_id.as_deref().unwrap_or("-"),
            entry.detail
        );
    }

    Ok(console.all_succeeded())
}

// ============================================================================
// Helpers
// ============================================================================

fn find_element(document: &Document, id: &str) -> Result<NodeId, NavigatorError> {
    document
        .element_by_id(id)
        .ok_or_else(|| NavigatorError::UnknownElement(id.to_string()))
}

/// Prints lifecycle callbacks to stdout and tallies finished submissions.
#[derive(Default)]
pub struct ConsoleDelegate {
    finished: Cell<usize>,
    failed: Cell<usize>,
}

impl ConsoleDelegate {
    /// At least one submission finished and none of them failed.
    pub fn all_succeeded(&self) -> bool {
        self.finished.get() > 0 && self.failed.get() == 0
    }
}

impl SubmissionDelegate for ConsoleDelegate {
    fn submission_started(&self, submission: &SubmissionController) {
        println!("started {} {}", submission.method(), submission.location());
    }

    fn submission_succeeded(&self, _submission: &SubmissionController, response: &FetchResponse) {
        println!("succeeded {} {}", response.status, response.location);
    }

    fn submission_failed(&self, _submission: &SubmissionController, response: &FetchResponse) {
        println!("failed {} {}", response.status, response.location);
    }

    fn submission_errored(&self, _submission: &SubmissionController, error: &FetchError) {
        println!("errored: {}", error);
    }

    fn submission_finished(&self, submission: &SubmissionController) {
        println!("finished ({:?})", submission.state());
        self.finished.set(self.finished.get() + 1);
        if !submission.result().is_some_and(|r| r.success()) {
            self.failed.set(self.failed.get() + 1);
        }
    }
}

impl NavigationDelegate for ConsoleDelegate {
    fn visit_proposed(&self, url: &Url) {
        println!("visit {}", url);
    }

    fn scope_navigated(&self, scope: &Scope, url: &Url) {
        println!("scope {} -> {}", scope.id, url);
    }
}
