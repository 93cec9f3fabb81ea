use crate::fetcher::AuditProgress;
use crate::models::{CourseBody, CourseReport};
use std::time::Duration;

#[derive(Debug, Clone)]
pub enum AppState {
    Input {
        input: String,
        message: Option<String>,
    },
    Running {
        progress: FetchProgress,
    },
    Results(ResultsView),
    Error {
        message: String,
    },
}

#[derive(Debug, Clone)]
pub struct ResultsView {
    pub reports: Vec<CourseReport>,
    pub elapsed: Duration,
    pub selected: usize,
    pub row_offset: usize,
    pub column_offset: usize,
    /// First rubric summary line shown.
    pub summary_offset: usize,
    pub notice: Option<String>,
}

impl ResultsView {
    pub fn new(reports: Vec<CourseReport>, elapsed: Duration) -> Self {
        Self {
            reports,
            elapsed,
            selected: 0,
            row_offset: 0,
            column_offset: 0,
            summary_offset: 0,
            notice: None,
        }
    }

    pub fn current(&self) -> Option<&CourseReport> {
        self.reports.get(self.selected)
    }

    pub fn next_course(&mut self) {
        if !self.reports.is_empty() {
            self.selected = (self.selected + 1) % self.reports.len();
            self.reset_scroll();
        }
    }

    pub fn previous_course(&mut self) {
        if !self.reports.is_empty() {
            self.selected = (self.selected + self.reports.len() - 1) % self.reports.len();
            self.reset_scroll();
        }
    }

    pub fn scroll_rows(&mut self, delta: isize) {
        let rows = self
            .current()
            .and_then(|r| r.grid())
            .map(|g| g.rows.len())
            .unwrap_or(0);
        self.row_offset = clamp_offset(self.row_offset, delta, rows);
    }

    /// Scrolls assignment columns; the student column stays pinned.
    pub fn scroll_columns(&mut self, delta: isize) {
        let columns = self
            .current()
            .and_then(|r| r.grid())
            .map(|g| g.columns.len().saturating_sub(1))
            .unwrap_or(0);
        self.column_offset = clamp_offset(self.column_offset, delta, columns);
    }

    pub fn scroll_summary(&mut self, delta: isize) {
        let lines = match self.current().map(|r| &r.body) {
            Some(CourseBody::Table { rubric_summary, .. }) => rubric_summary.len(),
            _ => 0,
        };
        self.summary_offset = clamp_offset(self.summary_offset, delta, lines);
    }

    fn reset_scroll(&mut self) {
        self.row_offset = 0;
        self.column_offset = 0;
        self.summary_offset = 0;
    }
}

fn clamp_offset(current: usize, delta: isize, len: usize) -> usize {
    let max = len.saturating_sub(1) as isize;
    (current as isize + delta).clamp(0, max.max(0)) as usize
}

#[derive(Debug, Clone)]
pub struct FetchProgress {
    pub total_courses: usize,
    pub completed: usize,
    pub current_course: Option<u64>,
    pub errors: usize,
    pub status_messages: Vec<String>,
}

impl FetchProgress {
    pub fn new(total_courses: usize) -> Self {
        Self {
            total_courses,
            completed: 0,
            current_course: None,
            errors: 0,
            status_messages: vec!["Initializing...".to_string()],
        }
    }

    pub fn add_status(&mut self, message: String) {
        self.status_messages.push(message);
        // Keep only the last 20 messages
        if self.status_messages.len() > 20 {
            self.status_messages.remove(0);
        }
    }

    pub fn apply(&mut self, event: AuditProgress) {
        match event {
            AuditProgress::CourseStarted {
                index,
                total,
                course_id,
            } => {
                self.current_course = Some(course_id);
                self.add_status(format!("[{}/{}] Course {}", index, total, course_id));
            }
            AuditProgress::AssignmentStarted {
                course_id,
                index,
                total,
                name,
            } => {
                self.current_course = Some(course_id);
                self.add_status(format!("  ({}/{}) {}", index, total, name));
            }
            AuditProgress::PageFetched {
                assignment,
                page,
                count,
            } => {
                self.add_status(format!("    ✓ {} page {}: {} submissions", assignment, page, count));
            }
            AuditProgress::Issue(issue) => {
                self.errors += 1;
                self.add_status(format!("  ✗ {}", issue));
            }
            AuditProgress::CourseFinished {
                course_id,
                students,
                issues,
            } => {
                self.completed += 1;
                let status = if issues == 0 {
                    format!("✓ Course {} done: {} students", course_id, students)
                } else {
                    format!(
                        "✓ Course {} done: {} students, {} issue(s)",
                        course_id, students, issues
                    )
                };
                self.add_status(status);
            }
        }
    }

    pub fn percentage(&self) -> f64 {
        if self.total_courses == 0 {
            0.0
        } else {
            (self.completed as f64 / self.total_courses as f64) * 100.0
        }
    }
}
