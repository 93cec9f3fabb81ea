use crate::aggregator;
use crate::api::CanvasApi;
use crate::classifier;
use crate::error::AuditIssue;
use crate::models::{Course, CourseBody, CourseHeader, CourseReport, UNKNOWN};
use crate::report;

/// Receives progress updates while an audit runs.
pub type ProgressCallback = dyn Fn(AuditProgress) + Send + Sync;

#[derive(Debug, Clone)]
pub enum AuditProgress {
    CourseStarted {
        index: usize,
        total: usize,
        course_id: u64,
    },
    AssignmentStarted {
        course_id: u64,
        index: usize,
        total: usize,
        name: String,
    },
    PageFetched {
        assignment: String,
        page: u32,
        count: usize,
    },
    Issue(AuditIssue),
    CourseFinished {
        course_id: u64,
        students: usize,
        issues: usize,
    },
}

/// Logs an issue, forwards it to the progress callback and keeps it for the report.
pub(crate) fn note_issue(
    issue: AuditIssue,
    issues: &mut Vec<AuditIssue>,
    progress: Option<&ProgressCallback>,
) {
    tracing::warn!("{}", issue);
    if let Some(callback) = progress {
        callback(AuditProgress::Issue(issue.clone()));
    }
    issues.push(issue);
}

async fn resolve_sub_account_name<A: CanvasApi>(
    api: &A,
    course: &Course,
    issues: &mut Vec<AuditIssue>,
    progress: Option<&ProgressCallback>,
) -> String {
    let Some(account_id) = course.account_id else {
        return UNKNOWN.to_string();
    };

    match api.get_sub_account(account_id).await {
        Ok(account) => account.name.unwrap_or_else(|| UNKNOWN.to_string()),
        Err(e) => {
            note_issue(
                AuditIssue::SubAccountFetch {
                    account_id,
                    reason: e.to_string(),
                },
                issues,
                progress,
            );
            UNKNOWN.to_string()
        }
    }
}

/// Builds the report of a single course.
///
/// Failures never abort the course: a failed course lookup only drops the
/// header block, a failed assignment listing drops the table, and failed
/// submission pages keep whatever was already fetched.
pub async fn audit_course<A: CanvasApi>(
    api: &A,
    course_id: u64,
    progress: Option<&ProgressCallback>,
) -> CourseReport {
    let mut issues = Vec::new();

    let header = match api.get_course(course_id).await {
        Ok(course) => {
            let sub_account_name =
                resolve_sub_account_name(api, &course, &mut issues, progress).await;
            Some(CourseHeader {
                course,
                sub_account_name,
            })
        }
        Err(e) => {
            note_issue(
                AuditIssue::CourseFetch {
                    course_id,
                    reason: e.to_string(),
                },
                &mut issues,
                progress,
            );
            None
        }
    };

    let assignments = match api.list_assignments(course_id).await {
        Ok(assignments) => assignments,
        Err(e) => {
            note_issue(
                AuditIssue::AssignmentsFetch {
                    course_id,
                    reason: e.to_string(),
                },
                &mut issues,
                progress,
            );
            Vec::new()
        }
    };

    if assignments.is_empty() {
        return CourseReport {
            course_id,
            header,
            body: CourseBody::NoAssignments,
            issues,
        };
    }

    let sorted = classifier::sort_assignments(&assignments);
    let massive = classifier::is_massive(&sorted);
    // The summary follows API order, the table follows sorted order
    let rubric_summary = classifier::rubric_summary(&assignments);

    let (table, submission_issues) =
        aggregator::aggregate_course(api, course_id, &sorted, progress).await;
    issues.extend(submission_issues);

    let grid = report::build(&sorted, &table);

    CourseReport {
        course_id,
        header,
        body: CourseBody::Table {
            massive,
            rubric_summary,
            grid,
        },
        issues,
    }
}

/// Audits every course in order, one at a time.
pub async fn run_audit<A: CanvasApi>(
    api: &A,
    course_ids: &[u64],
    progress: Option<&ProgressCallback>,
) -> Vec<CourseReport> {
    let total = course_ids.len();
    let mut reports = Vec::with_capacity(total);

    for (index, &course_id) in course_ids.iter().enumerate() {
        tracing::info!(course_id, "[{}/{}] Auditing course", index + 1, total);
        if let Some(callback) = progress {
            callback(AuditProgress::CourseStarted {
                index: index + 1,
                total,
                course_id,
            });
        }

        let report = audit_course(api, course_id, progress).await;

        let students = report.grid().map(|g| g.rows.len()).unwrap_or(0);
        tracing::info!(course_id, students, issues = report.issues.len(), "Course audited");
        if let Some(callback) = progress {
            callback(AuditProgress::CourseFinished {
                course_id,
                students,
                issues: report.issues.len(),
            });
        }
        reports.push(report);
    }

    reports
}

#[cfg(test)]
pub(crate) mod testing {
    use crate::api::CanvasApi;
    use crate::error::FetchError;
    use crate::models::{Assignment, Course, SubAccount, Submission};
    use reqwest::StatusCode;
    use std::collections::HashMap;
    use std::sync::Mutex;

    type Canned<T> = Result<T, StatusCode>;

    /// In-memory Canvas. Unknown resources answer 404; pages past the
    /// configured ones are empty.
    #[derive(Default)]
    pub struct FakeCanvas {
        courses: HashMap<u64, Course>,
        accounts: HashMap<u64, Canned<SubAccount>>,
        assignments: HashMap<u64, Canned<Vec<Assignment>>>,
        submission_pages: HashMap<(u64, u64), Vec<Canned<Vec<Submission>>>>,
        requests: Mutex<Vec<(u64, u32)>>,
    }

    fn failure(url: String, status: StatusCode) -> FetchError {
        FetchError::Status { url, status }
    }

    impl FakeCanvas {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_course(mut self, course: Course) -> Self {
            self.courses.insert(course.id, course);
            self
        }

        pub fn with_sub_account(mut self, account_id: u64, account: Canned<SubAccount>) -> Self {
            self.accounts.insert(account_id, account);
            self
        }

        pub fn with_assignments(mut self, course_id: u64, assignments: Canned<Vec<Assignment>>) -> Self {
            self.assignments.insert(course_id, assignments);
            self
        }

        pub fn with_submission_pages(
            mut self,
            course_id: u64,
            assignment_id: u64,
            pages: Vec<Canned<Vec<Submission>>>,
        ) -> Self {
            self.submission_pages.insert((course_id, assignment_id), pages);
            self
        }

        pub fn requested_pages(&self, assignment_id: u64) -> Vec<u32> {
            self.requests
                .lock()
                .unwrap()
                .iter()
                .filter(|(a, _)| *a == assignment_id)
                .map(|(_, p)| *p)
                .collect()
        }
    }

    impl CanvasApi for FakeCanvas {
        async fn get_course(&self, course_id: u64) -> Result<Course, FetchError> {
            self.courses
                .get(&course_id)
                .cloned()
                .ok_or_else(|| failure(format!("courses/{}", course_id), StatusCode::NOT_FOUND))
        }

        async fn get_sub_account(&self, account_id: u64) -> Result<SubAccount, FetchError> {
            let url = format!("accounts/{}", account_id);
            match self.accounts.get(&account_id) {
                Some(Ok(account)) => Ok(account.clone()),
                Some(Err(status)) => Err(failure(url, *status)),
                None => Err(failure(url, StatusCode::NOT_FOUND)),
            }
        }

        async fn list_assignments(&self, course_id: u64) -> Result<Vec<Assignment>, FetchError> {
            let url = format!("courses/{}/assignments", course_id);
            match self.assignments.get(&course_id) {
                Some(Ok(assignments)) => Ok(assignments.clone()),
                Some(Err(status)) => Err(failure(url, *status)),
                None => Err(failure(url, StatusCode::NOT_FOUND)),
            }
        }

        async fn list_submissions_page(
            &self,
            course_id: u64,
            assignment_id: u64,
            page: u32,
        ) -> Result<Vec<Submission>, FetchError> {
            self.requests.lock().unwrap().push((assignment_id, page));
            let url = format!(
                "courses/{}/assignments/{}/submissions?page={}",
                course_id, assignment_id, page
            );
            let pages = self.submission_pages.get(&(course_id, assignment_id));
            match pages.and_then(|p| p.get(page as usize - 1)) {
                Some(Ok(batch)) => Ok(batch.clone()),
                Some(Err(status)) => Err(failure(url, *status)),
                None => Ok(Vec::new()),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::FakeCanvas;
    use super::*;
    use crate::models::{Assignment, RubricPresence, Submission, SubAccount};
    use reqwest::StatusCode;
    use serde_json::json;
    use std::sync::{Arc, Mutex};

    fn course(id: u64, account_id: Option<u64>) -> Course {
        serde_json::from_value(json!({
            "id": id,
            "name": "Programación I",
            "sis_course_id": "PRG-101",
            "account_id": account_id,
            "course_code": "PRG101"
        }))
        .unwrap()
    }

    fn submissions(value: serde_json::Value) -> Vec<Submission> {
        serde_json::from_value(value).unwrap()
    }

    fn course_111_assignments() -> Vec<Assignment> {
        serde_json::from_value(json!([
            {
                "id": 2,
                "name": "Q1",
                "due_at": "2024-01-01T23:59:00Z",
                "submission_types": ["online_quiz"]
            },
            {
                "id": 1,
                "name": "F1",
                "due_at": null,
                "submission_types": ["discussion_topic"],
                "discussion_topic": { "id": 77 },
                "rubric": [{ "id": "c1" }]
            }
        ]))
        .unwrap()
    }

    #[tokio::test]
    async fn test_end_to_end_course_report() {
        let fake = FakeCanvas::new()
            .with_course(course(111, Some(42)))
            .with_sub_account(42, Ok(SubAccount { id: 42, name: Some("Ingeniería".to_string()) }))
            .with_assignments(111, Ok(course_111_assignments()))
            .with_submission_pages(
                111,
                1,
                vec![Ok(submissions(json!([
                    { "user": { "name": "Ana Lopez" }, "grade": "7.0", "rubric_assessment": { "c1": { "points": 4 } } }
                ])))],
            )
            .with_submission_pages(
                111,
                2,
                vec![Ok(submissions(json!([
                    { "user": { "name": "Beto Diaz" }, "grade": null, "rubric_assessment": null }
                ])))],
            );

        let report = audit_course(&fake, 111, None).await;

        assert!(report.issues.is_empty());
        let header = report.header.as_ref().unwrap();
        assert_eq!(header.sub_account_name, "Ingeniería");
        assert_eq!(header.course.display_sis_id(), "PRG-101");

        let CourseBody::Table { massive, rubric_summary, grid } = &report.body else {
            panic!("expected a table");
        };
        assert!(*massive);
        // API order: Q1 first
        assert_eq!(rubric_summary[0].assignment, "Q1");
        assert_eq!(rubric_summary[0].presence, RubricPresence::Massive);
        assert_eq!(rubric_summary[1].presence, RubricPresence::Present);

        assert_eq!(grid.columns, vec!["Student", "Graded?:F1", "Rubric?:F1", "Graded?:Q1"]);
        let rows: Vec<Vec<String>> = grid.rows.iter().map(|r| r.to_record()).collect();
        assert_eq!(
            rows,
            vec![
                vec!["Ana Lopez", "Sí", "Sí", "Sin Nota"],
                vec!["Beto Diaz", "Sin Nota", "Sin Nota", "No"],
            ]
        );
    }

    #[tokio::test]
    async fn test_course_fetch_failure_still_builds_table() {
        let fake = FakeCanvas::new().with_assignments(111, Ok(course_111_assignments()));

        let report = audit_course(&fake, 111, None).await;

        assert!(report.header.is_none());
        assert!(matches!(report.issues[0], AuditIssue::CourseFetch { course_id: 111, .. }));
        let grid = report.grid().unwrap();
        assert_eq!(grid.columns.len(), 4);
        assert!(grid.rows.is_empty());
    }

    #[tokio::test]
    async fn test_sub_account_failure_falls_back() {
        let fake = FakeCanvas::new()
            .with_course(course(111, Some(42)))
            .with_sub_account(42, Err(StatusCode::UNAUTHORIZED))
            .with_assignments(111, Ok(Vec::new()));

        let report = audit_course(&fake, 111, None).await;

        assert_eq!(report.header.unwrap().sub_account_name, UNKNOWN);
        assert!(matches!(report.issues[0], AuditIssue::SubAccountFetch { account_id: 42, .. }));
        assert!(matches!(report.body, CourseBody::NoAssignments));
    }

    #[tokio::test]
    async fn test_missing_account_id_is_unknown_without_issue() {
        let fake = FakeCanvas::new()
            .with_course(course(5, None))
            .with_assignments(5, Ok(Vec::new()));

        let report = audit_course(&fake, 5, None).await;
        assert_eq!(report.header.unwrap().sub_account_name, UNKNOWN);
        assert!(report.issues.is_empty());
    }

    #[tokio::test]
    async fn test_assignments_failure_skips_table() {
        let fake = FakeCanvas::new()
            .with_course(course(111, None))
            .with_assignments(111, Err(StatusCode::FORBIDDEN));

        let report = audit_course(&fake, 111, None).await;

        assert!(report.header.is_some());
        assert!(report.grid().is_none());
        assert!(matches!(report.issues[0], AuditIssue::AssignmentsFetch { course_id: 111, .. }));
        assert!(fake.requested_pages(1).is_empty());
    }

    #[tokio::test]
    async fn test_run_audit_continues_past_failed_courses() {
        let fake = FakeCanvas::new()
            .with_course(course(222, None))
            .with_assignments(222, Ok(course_111_assignments()));

        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = events.clone();
        let callback = move |event: AuditProgress| sink.lock().unwrap().push(event);
        let progress: &ProgressCallback = &callback;

        let reports = run_audit(&fake, &[111, 222], Some(progress)).await;

        assert_eq!(reports.len(), 2);
        assert_eq!(reports[0].course_id, 111);
        assert!(reports[0].grid().is_none());
        assert!(reports[1].grid().is_some());

        let events = events.lock().unwrap();
        let finished = events
            .iter()
            .filter(|e| matches!(e, AuditProgress::CourseFinished { .. }))
            .count();
        assert_eq!(finished, 2);
        assert!(events.iter().any(|e| matches!(e, AuditProgress::Issue(_))));
    }
}
