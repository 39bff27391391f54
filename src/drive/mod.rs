pub mod csrf;
pub mod form_submission;
pub mod submission_controller;
