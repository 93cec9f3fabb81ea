mod canvas;

pub use canvas::CanvasClient;

use crate::error::FetchError;
use crate::models::{Assignment, Course, SubAccount, Submission};
use std::future::Future;

/// Submissions requested per page.
pub const SUBMISSIONS_PER_PAGE: u32 = 100;

/// Read-only view of the Canvas resources the audit consumes.
///
/// Every call is a single request: no retries and no caching.
pub trait CanvasApi {
    fn get_course(&self, course_id: u64) -> impl Future<Output = Result<Course, FetchError>> + Send;

    fn get_sub_account(
        &self,
        account_id: u64,
    ) -> impl Future<Output = Result<SubAccount, FetchError>> + Send;

    /// Assignments of a course, in API order. Not paginated.
    fn list_assignments(
        &self,
        course_id: u64,
    ) -> impl Future<Output = Result<Vec<Assignment>, FetchError>> + Send;

    /// One page (1-based) of student submissions for an assignment.
    /// An empty page marks the end of the collection.
    fn list_submissions_page(
        &self,
        course_id: u64,
        assignment_id: u64,
        page: u32,
    ) -> impl Future<Output = Result<Vec<Submission>, FetchError>> + Send;
}
