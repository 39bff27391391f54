use frame_navigator::dom::document::FileBlob;
use frame_navigator::drive::form_submission::{FormEnctype, FormSubmission, form_owner};
use frame_navigator::error::NavigatorError;
use frame_navigator::http::fetch_request::{FetchBody, FetchMethod, FormEntry, FormValue};

use crate::common::utils::{button, form, page, text_input};

mod common;

// =========================================================================
// Method, action and enctype resolution
// =========================================================================

#[test]
fn defaults_to_get_against_document_url() {
    let (doc, body) = page();
    let f = form(&doc, body, &[]);

    let submission = FormSubmission::new(&doc, f, None).unwrap();
    assert_eq!(submission.method(), FetchMethod::Get);
    assert_eq!(submission.action(), "https://example.com/posts/1");
    assert_eq!(submission.location().as_str(), "https://example.com/posts/1");
    assert_eq!(submission.enctype(), FormEnctype::UrlEncoded);
    assert!(submission.is_idempotent());
}

#[test]
fn form_attributes_are_used_when_no_submitter() {
    let (doc, body) = page();
    let f = form(&doc, body, &[("method", "POST"), ("action", "/comments")]);

    let submission = FormSubmission::new(&doc, f, None).unwrap();
    assert_eq!(submission.method(), FetchMethod::Post);
    assert_eq!(submission.location().as_str(), "https://example.com/comments");
    assert!(!submission.is_idempotent());
}

#[test]
fn submitter_overrides_win_over_form() {
    let (doc, body) = page();
    let f = form(
        &doc,
        body,
        &[("method", "post"), ("action", "/a"), ("enctype", "multipart/form-data")],
    );
    let b = button(
        &doc,
        f,
        &[("formmethod", "Patch"), ("formaction", "/b"), ("formenctype", "text/plain")],
    );

    let submission = FormSubmission::new(&doc, f, Some(b)).unwrap();
    assert_eq!(submission.method(), FetchMethod::Patch);
    assert_eq!(submission.action(), "/b");
    assert_eq!(submission.location().as_str(), "https://example.com/b");
    assert_eq!(submission.enctype(), FormEnctype::Plain);
}

#[test]
fn empty_submitter_overrides_fall_back_to_form() {
    let (doc, body) = page();
    let f = form(&doc, body, &[("method", "delete"), ("action", "/x")]);
    let b = button(&doc, f, &[("formmethod", ""), ("formaction", "")]);

    let submission = FormSubmission::new(&doc, f, Some(b)).unwrap();
    assert_eq!(submission.method(), FetchMethod::Delete);
    assert_eq!(submission.action(), "/x");
}

#[test]
fn unknown_method_falls_back_to_get() {
    let (doc, body) = page();
    let f = form(&doc, body, &[("method", "teleport")]);
    assert_eq!(FormSubmission::new(&doc, f, None).unwrap().method(), FetchMethod::Get);
}

#[test]
fn enctype_is_case_insensitive_and_defaults_to_urlencoded() {
    assert_eq!(FormEnctype::parse("MULTIPART/FORM-DATA"), FormEnctype::Multipart);
    assert_eq!(FormEnctype::parse("Text/Plain"), FormEnctype::Plain);
    assert_eq!(FormEnctype::parse("application/json"), FormEnctype::UrlEncoded);
    assert_eq!(FormEnctype::parse(""), FormEnctype::UrlEncoded);
}

#[test]
fn action_expands_against_base_element() {
    let (doc, body) = page();
    let head = doc.append_element(doc.root(), "head", &[]);
    doc.append_element(head, "base", &[("href", "/app/")]);
    let f = form(&doc, body, &[("action", "items")]);

    let submission = FormSubmission::new(&doc, f, None).unwrap();
    assert_eq!(submission.location().as_str(), "https://example.com/app/items");
}

// =========================================================================
// Construction errors
// =========================================================================

#[test]
fn rejects_non_form_elements() {
    let (doc, body) = page();
    let div = doc.append_element(body, "div", &[("id", "box")]);

    match FormSubmission::new(&doc, div, None) {
        Err(NavigatorError::NotAForm { element }) => assert_eq!(element, "div#box"),
        other => panic!("Expected NotAForm, got {:?}", other),
    }
}

#[test]
fn rejects_submitter_owned_by_another_form() {
    let (doc, body) = page();
    let a = form(&doc, body, &[("id", "a")]);
    let b = form(&doc, body, &[("id", "b")]);
    let foreign = button(&doc, b, &[]);

    assert!(matches!(
        FormSubmission::new(&doc, a, Some(foreign)),
        Err(NavigatorError::ForeignSubmitter { .. })
    ));
}

#[test]
fn submitter_may_be_associated_by_form_attribute() {
    let (doc, body) = page();
    let f = form(&doc, body, &[("id", "remote")]);
    let outside = doc.append_element(body, "button", &[("form", "remote"), ("name", "go"), ("value", "1")]);

    assert_eq!(form_owner(&doc, outside), Some(f));
    let submission = FormSubmission::new(&doc, f, Some(outside)).unwrap();
    assert_eq!(submission.form_data(), &[FormEntry::text("go", "1")]);
}

// =========================================================================
// Form data
// =========================================================================

#[test]
fn collects_controls_in_document_order() {
    let (doc, body) = page();
    let f = form(&doc, body, &[("method", "post")]);
    text_input(&doc, f, "title", "Hello");
    let check = doc.append_element(f, "input", &[("type", "checkbox"), ("name", "publish")]);
    doc.set_checked(check, true);
    doc.append_element(f, "input", &[("type", "checkbox"), ("name", "pin"), ("value", "yes")]);
    let area = doc.append_element(f, "textarea", &[("name", "body")]);
    doc.set_value(area, "Text");
    let select = doc.append_element(f, "select", &[("name", "tag")]);
    doc.append_element(select, "option", &[("value", "a")]);
    doc.append_element(select, "option", &[("value", "b"), ("selected", "")]);

    let submission = FormSubmission::new(&doc, f, None).unwrap();
    assert_eq!(
        submission.form_data(),
        &[
            FormEntry::text("title", "Hello"),
            FormEntry::text("publish", "on"),
            FormEntry::text("body", "Text"),
            FormEntry::text("tag", "b"),
        ]
    );
}

#[test]
fn skips_disabled_unnamed_and_button_controls() {
    let (doc, body) = page();
    let f = form(&doc, body, &[]);
    doc.append_element(f, "input", &[("name", "off"), ("value", "x"), ("disabled", "")]);
    doc.append_element(f, "input", &[("value", "anonymous")]);
    doc.append_element(f, "input", &[("type", "submit"), ("name", "commit"), ("value", "Save")]);
    let fieldset = doc.append_element(f, "fieldset", &[("disabled", "")]);
    text_input(&doc, fieldset, "inner", "x");
    text_input(&doc, f, "kept", "y");

    let submission = FormSubmission::new(&doc, f, None).unwrap();
    assert_eq!(submission.form_data(), &[FormEntry::text("kept", "y")]);
}

#[test]
fn submitter_name_and_value_are_appended() {
    let (doc, body) = page();
    let f = form(&doc, body, &[("method", "post")]);
    text_input(&doc, f, "q", "rust");
    let b = button(&doc, f, &[("name", "commit"), ("value", "Publish")]);

    let submission = FormSubmission::new(&doc, f, Some(b)).unwrap();
    assert_eq!(
        submission.form_data(),
        &[FormEntry::text("q", "rust"), FormEntry::text("commit", "Publish")]
    );
}

#[test]
fn submitter_entry_not_duplicated() {
    let (doc, body) = page();
    let f = form(&doc, body, &[]);
    doc.append_element(f, "input", &[("type", "hidden"), ("name", "commit"), ("value", "Publish")]);
    let b = button(&doc, f, &[("name", "commit"), ("value", "Publish")]);

    let submission = FormSubmission::new(&doc, f, Some(b)).unwrap();
    assert_eq!(submission.form_data(), &[FormEntry::text("commit", "Publish")]);
}

#[test]
fn submitter_with_same_name_but_other_value_is_appended() {
    let (doc, body) = page();
    let f = form(&doc, body, &[]);
    doc.append_element(f, "input", &[("type", "hidden"), ("name", "commit"), ("value", "Draft")]);
    let b = button(&doc, f, &[("name", "commit"), ("value", "Publish")]);

    let submission = FormSubmission::new(&doc, f, Some(b)).unwrap();
    assert_eq!(
        submission.form_data(),
        &[FormEntry::text("commit", "Draft"), FormEntry::text("commit", "Publish")]
    );
}

#[test]
fn submitter_without_name_adds_nothing() {
    let (doc, body) = page();
    let f = form(&doc, body, &[]);
    let b = button(&doc, f, &[("value", "Go")]);

    let submission = FormSubmission::new(&doc, f, Some(b)).unwrap();
    assert!(submission.form_data().is_empty());
}

// =========================================================================
// Body selection
// =========================================================================

fn form_with_file(method: &str, enctype: &str) -> FormSubmission {
    let (doc, body) = page();
    let f = form(&doc, body, &[("method", method), ("enctype", enctype)]);
    text_input(&doc, f, "caption", "cat");
    let input = doc.append_element(f, "input", &[("type", "file"), ("name", "photo")]);
    doc.attach_file(
        input,
        FileBlob {
            name: "cat.png".into(),
            content_type: "image/png".into(),
            bytes: vec![1, 2, 3],
        },
    );
    FormSubmission::new(&doc, f, None).unwrap()
}

#[test]
fn multipart_post_keeps_files() {
    let submission = form_with_file("post", "multipart/form-data");
    match submission.body() {
        FetchBody::FormData(entries) => {
            assert_eq!(entries.len(), 2);
            assert!(matches!(&entries[1].value, FormValue::File(f) if f.name == "cat.png"));
        }
        other => panic!("Expected FormData, got {:?}", other),
    }
}

#[test]
fn urlencoded_post_drops_files() {
    let submission = form_with_file("post", "application/x-www-form-urlencoded");
    assert_eq!(
        submission.body(),
        FetchBody::Params(vec![("caption".into(), "cat".into())])
    );
}

#[test]
fn get_drops_files_even_when_multipart() {
    let submission = form_with_file("get", "multipart/form-data");
    assert_eq!(
        submission.body(),
        FetchBody::Params(vec![("caption".into(), "cat".into())])
    );
}

// =========================================================================
// Fingerprint
// =========================================================================

#[test]
fn fingerprint_is_stable_and_content_sensitive() {
    let (doc, body) = page();
    let f = form(&doc, body, &[("method", "post"), ("action", "/c")]);
    let input = text_input(&doc, f, "q", "one");

    let first = FormSubmission::new(&doc, f, None).unwrap().fingerprint();
    let again = FormSubmission::new(&doc, f, None).unwrap().fingerprint();
    assert_eq!(first, again);
    assert_eq!(first.len(), 40, "SHA-1 hex digest");

    doc.set_value(input, "two");
    let changed = FormSubmission::new(&doc, f, None).unwrap().fingerprint();
    assert_ne!(first, changed);
}
