use std::rc::Rc;

use frame_navigator::dom::document::Document;
use frame_navigator::dom::event::CustomEvent;
use frame_navigator::drive::submission_controller::{SUBMIT_END_EVENT, SubmissionState};
use frame_navigator::frames::target_resolver::{EscapePolicy, ResolverConfig};
use frame_navigator::http::fetch_request::FetchMethod;
use frame_navigator::http::fetch_response::FetchResponse;
use frame_navigator::http::transport::FetchEvent;
use frame_navigator::session::navigator::{Navigator, NavigatorConfig, NavigatorDelegates};

use crate::common::scripted::{RecordingDelegate, ScriptedFactory, SharedLog};
use crate::common::utils::{form, frame, link, page, text_input, url};

mod common;

struct Harness {
    navigator: Navigator,
    page_delegate: Rc<RecordingDelegate>,
    scope_delegate: Rc<RecordingDelegate>,
    log: SharedLog,
}

fn harness(doc: &Rc<Document>, config: NavigatorConfig, response: FetchResponse) -> Harness {
    let page_delegate = RecordingDelegate::new();
    let scope_delegate = RecordingDelegate::new();
    let (factory, log) = ScriptedFactory::new(vec![FetchEvent::Succeeded(response), FetchEvent::Finished]);

    let mut navigator = Navigator::new(
        Rc::clone(doc),
        config,
        Box::new(factory),
        NavigatorDelegates {
            page: page_delegate.clone(),
            scope: scope_delegate.clone(),
            navigation: page_delegate.clone(),
        },
    );
    navigator.start();

    Harness {
        navigator,
        page_delegate,
        scope_delegate,
        log,
    }
}

fn plain_200() -> FetchResponse {
    FetchResponse::new(200, url("https://example.com/comments"))
}

// =========================================================================
// Form submissions
// =========================================================================

#[test]
fn page_form_submission_requires_redirect() {
    let (doc, body) = page();
    let f = form(&doc, body, &[("method", "post"), ("action", "/comments")]);
    text_input(&doc, f, "body", "hi");
    let mut h = harness(&doc, NavigatorConfig::default(), plain_200());

    let event = h.navigator.submit(f, None);
    assert!(event.flags.default_prevented());
    assert_eq!(h.navigator.submissions().len(), 1);
    let submission = &h.navigator.submissions()[0];
    assert_eq!(submission.state(), SubmissionState::Requesting);
    assert!(submission.options().must_redirect);

    h.navigator.run_until_idle();
    assert!(h.navigator.submissions().is_empty());
    assert_eq!(
        h.page_delegate.calls(),
        vec!["started:Waiting", "errored:MissingRedirect", "finished:Stopped"]
    );
    assert!(h.scope_delegate.calls().is_empty());
}

#[test]
fn page_must_redirect_can_be_disabled() {
    let (doc, body) = page();
    let f = form(&doc, body, &[("method", "post"), ("action", "/comments")]);
    let config = NavigatorConfig {
        page_must_redirect: false,
        ..NavigatorConfig::default()
    };
    let mut h = harness(&doc, config, plain_200());

    h.navigator.submit(f, None);
    h.navigator.run_until_idle();
    assert_eq!(h.page_delegate.calls()[1], "succeeded:200");
}

#[test]
fn scope_form_submission_runs_in_scope_without_redirect_requirement() {
    let (doc, body) = page();
    let comments = frame(&doc, body, "comments");
    doc.set_attribute(comments, "reloadable", "");
    let f = form(&doc, comments, &[("method", "post"), ("action", "/comments")]);
    let mut h = harness(&doc, NavigatorConfig::default(), plain_200());

    h.navigator.submit(f, None);
    assert!(!h.navigator.submissions()[0].options().must_redirect);
    h.navigator.run_until_idle();

    assert_eq!(
        h.scope_delegate.calls(),
        vec!["started:Waiting", "succeeded:200", "finished:Stopped"]
    );
    assert!(h.page_delegate.calls().is_empty());
    assert!(!doc.has_attribute(comments, "reloadable"));
}

#[test]
fn redirected_form_submission_goes_to_named_scope() {
    let (doc, body) = page();
    frame(&doc, body, "modal");
    let f = form(&doc, body, &[("method", "post"), ("data-turbo-frame", "modal")]);
    let mut h = harness(&doc, NavigatorConfig::default(), plain_200());

    h.navigator.submit(f, None);
    h.navigator.run_until_idle();

    assert_eq!(h.scope_delegate.calls()[1], "succeeded:200");
    assert!(h.page_delegate.calls().is_empty());
}

#[test]
fn get_form_escaping_top_respects_policy() {
    for (policy, in_scope) in [(EscapePolicy::GetStaysInScope, true), (EscapePolicy::GetEscapes, false)] {
        let (doc, body) = page();
        let search = frame(&doc, body, "search");
        let f = form(&doc, search, &[("method", "get"), ("action", "/search"), ("data-turbo-frame", "_top")]);
        text_input(&doc, f, "q", "rust");
        let config = NavigatorConfig {
            resolver: ResolverConfig {
                get_policy: policy,
                ..ResolverConfig::default()
            },
            ..NavigatorConfig::default()
        };
        let mut h = harness(&doc, config, plain_200());

        h.navigator.submit(f, None);
        h.navigator.run_until_idle();

        assert_eq!(h.log.borrow().requests[0].method, FetchMethod::Get);
        assert_eq!(h.log.borrow().requests[0].url.as_str(), "https://example.com/search?q=rust");
        assert_eq!(!h.scope_delegate.calls().is_empty(), in_scope, "{:?}", policy);
        assert_eq!(!h.page_delegate.calls().is_empty(), !in_scope, "{:?}", policy);
    }
}

#[test]
fn drive_disabled_leaves_root_forms_to_browser() {
    let (doc, body) = page();
    let f = form(&doc, body, &[("method", "post")]);
    let config = NavigatorConfig {
        drive_enabled: false,
        ..NavigatorConfig::default()
    };
    let mut h = harness(&doc, config, plain_200());

    let event = h.navigator.submit(f, None);
    assert!(!event.flags.default_prevented());
    assert!(h.navigator.submissions().is_empty());
    assert!(h.log.borrow().requests.is_empty());
}

#[test]
fn dialog_forms_are_never_submitted() {
    let (doc, body) = page();
    let f = form(&doc, body, &[("method", "dialog")]);
    let mut h = harness(&doc, NavigatorConfig::default(), plain_200());

    let event = h.navigator.submit(f, None);
    assert!(!event.flags.default_prevented());
    assert!(h.navigator.submissions().is_empty());
}

#[test]
fn stopped_navigator_intercepts_nothing() {
    let (doc, body) = page();
    let f = form(&doc, body, &[("method", "post")]);
    let mut h = harness(&doc, NavigatorConfig::default(), plain_200());

    h.navigator.stop();
    assert!(!h.navigator.submit(f, None).flags.default_prevented());
}

#[test]
fn submissions_can_be_cancelled() {
    let (doc, body) = page();
    let f = form(&doc, body, &[("method", "post")]);
    let mut h = harness(&doc, NavigatorConfig::default(), plain_200());

    h.navigator.submit(f, None);
    assert_eq!(h.navigator.active_submissions(), 1);
    assert_eq!(h.navigator.stop_submissions(), 1);
    assert_eq!(h.navigator.stop_submissions(), 0, "already stopping");

    h.navigator.run_until_idle();
    assert_eq!(h.navigator.active_submissions(), 0);
    assert_eq!(h.log.borrow().cancels, 1);
    assert!(h.page_delegate.calls().contains(&"errored:Aborted".to_string()));
}

#[test]
fn finished_submissions_are_released() {
    let (doc, body) = page();
    let f = form(&doc, body, &[("method", "post"), ("action", "/comments")]);
    let redirect = FetchResponse::new(200, url("https://example.com/comments/1")).with_redirected(true);
    let mut h = harness(&doc, NavigatorConfig::default(), redirect);

    for _ in 0..50 {
        h.navigator.submit(f, None);
        h.navigator.run_until_idle();
        assert!(h.navigator.submissions().is_empty());
    }

    assert_eq!(h.log.borrow().requests.len(), 50);
    assert_eq!(h.navigator.active_submissions(), 0);
    let finished = h.page_delegate.calls().iter().filter(|c| *c == "finished:Stopped").count();
    assert_eq!(finished, 50);
    assert_eq!(doc.take_event_log().len(), 100, "start and end per submission");
    assert!(doc.event_log().is_empty());
}

#[test]
fn cancelled_submissions_are_released_once_finished() {
    let (doc, body) = page();
    let f = form(&doc, body, &[("method", "post")]);
    let mut h = harness(&doc, NavigatorConfig::default(), plain_200());

    h.navigator.submit(f, None);
    h.navigator.submit(f, None);
    assert_eq!(h.navigator.stop_submissions(), 2);
    assert_eq!(h.navigator.submissions().len(), 2, "stopping until the transport finishes");

    h.navigator.run_until_idle();
    assert!(h.navigator.submissions().is_empty());
}

#[test]
fn end_notification_bubbles_to_listeners() {
    let (doc, body) = page();
    let f = form(&doc, body, &[("method", "post")]);
    let seen = Rc::new(std::cell::Cell::new(0));
    let counter = Rc::clone(&seen);
    doc.add_event_listener(body, SUBMIT_END_EVENT, Rc::new(move |_: &CustomEvent| counter.set(counter.get() + 1)));
    let mut h = harness(&doc, NavigatorConfig::default(), plain_200());

    h.navigator.submit(f, None);
    h.navigator.run_until_idle();
    assert_eq!(seen.get(), 1);
}

// =========================================================================
// Link clicks
// =========================================================================

#[test]
fn link_into_scope_loads_the_scope() {
    let (doc, body) = page();
    let nav = frame(&doc, body, "nav");
    let main = frame(&doc, body, "main");
    let a = link(&doc, nav, "/articles/2", &[("data-turbo-frame", "main")]);
    let mut h = harness(&doc, NavigatorConfig::default(), plain_200());

    let event = h.navigator.click(a);
    assert!(event.flags.default_prevented());
    assert_eq!(doc.attribute(main, "src").as_deref(), Some("https://example.com/articles/2"));
    assert!(doc.has_attribute(main, "reloadable"));
    assert_eq!(
        *h.page_delegate.scope_loads.borrow(),
        vec![("main".to_string(), url("https://example.com/articles/2"))]
    );
    assert!(h.navigator.submissions().is_empty());
}

#[test]
fn link_at_root_proposes_a_visit() {
    let (doc, body) = page();
    let a = link(&doc, body, "/about", &[]);
    let mut h = harness(&doc, NavigatorConfig::default(), plain_200());

    h.navigator.click(a);
    assert_eq!(*h.page_delegate.visits.borrow(), vec![url("https://example.com/about")]);
}

#[test]
fn link_escaping_scope_proposes_a_visit() {
    let (doc, body) = page();
    let scope = frame(&doc, body, "s");
    let a = link(&doc, scope, "/home", &[("data-turbo-frame", "_top")]);
    let mut h = harness(&doc, NavigatorConfig::default(), plain_200());

    h.navigator.click(a);
    assert_eq!(*h.page_delegate.visits.borrow(), vec![url("https://example.com/home")]);
    assert!(!doc.has_attribute(scope, "src"));
}

#[test]
fn cross_origin_link_is_left_alone() {
    let (doc, body) = page();
    let a = link(&doc, body, "https://other.test/", &[]);
    let mut h = harness(&doc, NavigatorConfig::default(), plain_200());

    assert!(!h.navigator.click(a).flags.default_prevented());
    assert!(h.page_delegate.visits.borrow().is_empty());
}
