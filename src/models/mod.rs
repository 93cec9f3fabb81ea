use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::AuditIssue;

pub const UNNAMED: &str = "Sin nombre";
pub const NO_SIS_ID: &str = "Sin ID SIS";
pub const UNKNOWN: &str = "Desconocido";
pub const QUIZ_SUBMISSION_TYPE: &str = "online_quiz";

// ============================================================================
// Canvas API Models
// ============================================================================

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Course {
    pub id: u64,
    pub name: Option<String>,
    pub sis_course_id: Option<String>,
    pub account_id: Option<u64>,
    pub course_code: Option<String>,
}

impl Course {
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(UNNAMED)
    }

    pub fn display_sis_id(&self) -> &str {
        self.sis_course_id.as_deref().unwrap_or(NO_SIS_ID)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SubAccount {
    pub id: u64,
    pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Assignment {
    pub id: u64,
    pub name: Option<String>,
    pub due_at: Option<String>,
    #[serde(default)]
    pub submission_types: Vec<String>,
    pub discussion_topic: Option<Value>,
    pub group_category_id: Option<u64>,
    pub rubric: Option<Value>,
    pub rubric_settings: Option<Value>,
}

impl Assignment {
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(UNNAMED)
    }

    /// Quiz assignments never get a rubric column.
    pub fn is_quiz(&self) -> bool {
        self.submission_types
            .iter()
            .any(|t| t == QUIZ_SUBMISSION_TYPE)
    }

    /// Whether the assignment definition itself carries a rubric.
    pub fn has_rubric(&self) -> bool {
        is_truthy(self.rubric.as_ref()) || is_truthy(self.rubric_settings.as_ref())
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Submission {
    pub user: Option<SubmissionUser>,
    pub grade: Option<Value>,
    pub rubric_assessment: Option<Value>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SubmissionUser {
    pub name: Option<String>,
}

impl Submission {
    pub fn student_name(&self) -> &str {
        self.user
            .as_ref()
            .and_then(|u| u.name.as_deref())
            .filter(|n| !n.trim().is_empty())
            .unwrap_or(UNKNOWN)
    }

    pub fn is_graded(&self) -> bool {
        self.grade.is_some()
    }

    pub fn used_rubric(&self) -> bool {
        matches!(&self.rubric_assessment, Some(Value::Object(map)) if !map.is_empty())
    }
}

/// JSON truthiness: null, false, zero and empty strings/arrays/objects are false.
fn is_truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(a)) => !a.is_empty(),
        Some(Value::Object(o)) => !o.is_empty(),
    }
}

// ============================================================================
// Internal Models for Reporting
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GradeCell {
    pub graded: bool,
    pub rubric_used: bool,
}

impl GradeCell {
    pub fn from_submission(submission: &Submission) -> Self {
        Self {
            graded: submission.is_graded(),
            rubric_used: submission.used_rubric(),
        }
    }

    pub fn marks(cell: Option<&GradeCell>) -> (Mark, Mark) {
        match cell {
            Some(c) => (Mark::from_bool(c.graded), Mark::from_bool(c.rubric_used)),
            None => (Mark::NoGrade, Mark::NoGrade),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mark {
    Yes,
    No,
    NoGrade,
}

impl Mark {
    pub fn from_bool(value: bool) -> Self {
        if value {
            Mark::Yes
        } else {
            Mark::No
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Mark::Yes => "Sí",
            Mark::No => "No",
            Mark::NoGrade => "Sin Nota",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportRow {
    pub student: String,
    pub marks: Vec<Mark>,
}

impl ReportRow {
    pub fn to_record(&self) -> Vec<String> {
        std::iter::once(self.student.clone())
            .chain(self.marks.iter().map(|m| m.as_str().to_string()))
            .collect()
    }
}

/// Rectangular student × assignment matrix ready for rendering.
#[derive(Debug, Clone, Default)]
pub struct GradeGrid {
    pub columns: Vec<String>,
    pub rows: Vec<ReportRow>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RubricPresence {
    Massive,
    Present,
    Missing,
}

#[derive(Debug, Clone)]
pub struct RubricSummaryLine {
    pub assignment: String,
    pub presence: RubricPresence,
}

#[derive(Debug, Clone)]
pub struct CourseHeader {
    pub course: Course,
    pub sub_account_name: String,
}

#[derive(Debug, Clone)]
pub enum CourseBody {
    NoAssignments,
    Table {
        massive: bool,
        rubric_summary: Vec<RubricSummaryLine>,
        grid: GradeGrid,
    },
}

#[derive(Debug, Clone)]
pub struct CourseReport {
    pub course_id: u64,
    pub header: Option<CourseHeader>,
    pub body: CourseBody,
    pub issues: Vec<AuditIssue>,
}

impl CourseReport {
    pub fn grid(&self) -> Option<&GradeGrid> {
        match &self.body {
            CourseBody::Table { grid, .. } => Some(grid),
            CourseBody::NoAssignments => None,
        }
    }
}
