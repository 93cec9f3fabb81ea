use thiserror::Error;

/// Failure of a single Canvas API request.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} returned status {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("failed to parse JSON response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Non-fatal problems surfaced inline in a course report.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuditIssue {
    #[error("Error fetching course info for course {course_id}: {reason}")]
    CourseFetch { course_id: u64, reason: String },

    #[error("Error fetching sub-account {account_id}: {reason}")]
    SubAccountFetch { account_id: u64, reason: String },

    #[error("Error fetching assignments for course {course_id}: {reason}")]
    AssignmentsFetch { course_id: u64, reason: String },

    #[error("Error fetching submissions for assignment {assignment_name} ({assignment_id}) at page {page}: {reason}")]
    SubmissionsFetch {
        assignment_id: u64,
        assignment_name: String,
        page: u32,
        reason: String,
    },
}
