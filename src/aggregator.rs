use crate::api::CanvasApi;
use crate::error::{AuditIssue, FetchError};
use crate::fetcher::{note_issue, AuditProgress, ProgressCallback};
use crate::models::{Assignment, GradeCell, Submission};
use indexmap::IndexMap;

/// Synthetic Canvas user present in every course.
pub const TEST_STUDENT_MARKER: &str = "estudiante de prueba";

/// Merge key for student names: case-insensitive, whitespace collapsed.
pub fn normalize_name(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

pub fn is_test_student(name: &str) -> bool {
    name.to_lowercase().contains(TEST_STUDENT_MARKER)
}

#[derive(Debug, Clone)]
pub struct StudentGrades {
    /// First spelling seen, trimmed.
    pub name: String,
    cells: IndexMap<u64, GradeCell>,
}

impl StudentGrades {
    pub fn cell(&self, assignment_id: u64) -> Option<&GradeCell> {
        self.cells.get(&assignment_id)
    }
}

/// student → assignment → grading status, for a single course.
#[derive(Debug, Clone, Default)]
pub struct GradeTable {
    students: IndexMap<String, StudentGrades>,
}

impl GradeTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts one submission. Returns false if it was skipped as a test user.
    /// A repeated (student, assignment) pair overwrites the earlier cell.
    pub fn record(&mut self, assignment_id: u64, submission: &Submission) -> bool {
        let name = submission.student_name().trim();
        if is_test_student(name) {
            return false;
        }

        let student = self
            .students
            .entry(normalize_name(name))
            .or_insert_with(|| StudentGrades {
                name: name.to_string(),
                cells: IndexMap::new(),
            });
        student
            .cells
            .insert(assignment_id, GradeCell::from_submission(submission));
        true
    }

    /// Merges the complete page set of one assignment.
    pub fn merge_assignment(&mut self, assignment_id: u64, submissions: &[Submission]) -> usize {
        submissions
            .iter()
            .filter(|s| self.record(assignment_id, s))
            .count()
    }

    pub fn students(&self) -> impl Iterator<Item = &StudentGrades> {
        self.students.values()
    }

    pub fn len(&self) -> usize {
        self.students.len()
    }

    pub fn is_empty(&self) -> bool {
        self.students.is_empty()
    }
}

#[derive(Debug)]
pub struct SubmissionPages {
    pub submissions: Vec<Submission>,
    /// Number of page requests issued, including the terminating one.
    pub requests: u32,
    /// Page that failed, with its error. Earlier pages are kept.
    pub failure: Option<(u32, FetchError)>,
}

/// Walks the submission pages of one assignment from page 1 until an empty
/// page or the first failed request.
pub async fn fetch_all_submissions<A: CanvasApi>(
    api: &A,
    course_id: u64,
    assignment: &Assignment,
    progress: Option<&ProgressCallback>,
) -> SubmissionPages {
    let mut submissions = Vec::new();
    let mut page = 1;
    let mut requests = 0;

    let failure = loop {
        requests += 1;
        match api
            .list_submissions_page(course_id, assignment.id, page)
            .await
        {
            Ok(batch) if batch.is_empty() => break None,
            Ok(batch) => {
                if let Some(callback) = progress {
                    callback(AuditProgress::PageFetched {
                        assignment: assignment.display_name().to_string(),
                        page,
                        count: batch.len(),
                    });
                }
                submissions.extend(batch);
                page += 1;
            }
            Err(e) => break Some((page, e)),
        }
    };

    SubmissionPages {
        submissions,
        requests,
        failure,
    }
}

/// Fetches and merges submissions for every assignment of a course, in the
/// given order. Failed assignments keep whatever pages arrived before the
/// failure and are reported as issues.
pub async fn aggregate_course<A: CanvasApi>(
    api: &A,
    course_id: u64,
    assignments: &[Assignment],
    progress: Option<&ProgressCallback>,
) -> (GradeTable, Vec<AuditIssue>) {
    let mut table = GradeTable::new();
    let mut issues = Vec::new();

    for (index, assignment) in assignments.iter().enumerate() {
        if let Some(callback) = progress {
            callback(AuditProgress::AssignmentStarted {
                course_id,
                index: index + 1,
                total: assignments.len(),
                name: assignment.display_name().to_string(),
            });
        }

        let pages = fetch_all_submissions(api, course_id, assignment, progress).await;
        let merged = table.merge_assignment(assignment.id, &pages.submissions);
        tracing::debug!(
            course_id,
            assignment_id = assignment.id,
            fetched = pages.submissions.len(),
            merged,
            requests = pages.requests,
            "Merged submissions"
        );

        if let Some((page, e)) = pages.failure {
            note_issue(
                AuditIssue::SubmissionsFetch {
                    assignment_id: assignment.id,
                    assignment_name: assignment.display_name().to_string(),
                    page,
                    reason: e.to_string(),
                },
                &mut issues,
                progress,
            );
        }
    }

    tracing::debug!(course_id, students = table.len(), "Course submissions aggregated");
    (table, issues)
}
