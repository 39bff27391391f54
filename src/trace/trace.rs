use serde::Serialize;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::drive::submission_controller::SubmissionState;

/// One line of the submission lifecycle trace.
#[derive(Debug, Serialize)]
pub struct TraceEvent {
    pub timestamp_ms: u128,
    pub submission: String,

    pub state: String,
    pub callback: String,

    pub method: Option<String>,
    pub location: Option<String>,

    pub status: Option<u16>,
    pub error: Option<String>,
}

impl TraceEvent {
    pub fn now(submission: &str, state: SubmissionState, callback: &str) -> Self {
        Self {
            timestamp_ms: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_millis())
                .unwrap_or(0),
            submission: submission.to_string(),
            state: format!("{:?}", state),
            callback: callback.to_string(),
            method: None,
            location: None,
            status: None,
            error: None,
        }
    }

    pub fn with_request(mut self, method: impl ToString, location: impl ToString) -> Self {
        self.method = Some(method.to_string());
        self.location = Some(location.to_string());
        self
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_error(mut self, error: impl ToString) -> Self {
        self.error = Some(error.to_string());
        self
    }
}
