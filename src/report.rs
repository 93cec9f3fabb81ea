use crate::aggregator::{GradeTable, StudentGrades};
use crate::models::{Assignment, GradeCell, GradeGrid, ReportRow};

pub const STUDENT_COLUMN: &str = "Student";

pub fn graded_column(assignment: &Assignment) -> String {
    format!("Graded?:{}", assignment.display_name())
}

pub fn rubric_column(assignment: &Assignment) -> String {
    format!("Rubric?:{}", assignment.display_name())
}

/// Column schema: the student column, then per assignment a graded column and,
/// unless it is a quiz, a rubric column.
pub fn columns(assignments: &[Assignment]) -> Vec<String> {
    let mut columns = vec![STUDENT_COLUMN.to_string()];
    for assignment in assignments {
        columns.push(graded_column(assignment));
        if !assignment.is_quiz() {
            columns.push(rubric_column(assignment));
        }
    }
    columns
}

fn row(student: &StudentGrades, assignments: &[Assignment]) -> ReportRow {
    let mut marks = Vec::with_capacity(assignments.len() * 2);
    for assignment in assignments {
        let (graded, rubric) = GradeCell::marks(student.cell(assignment.id));
        marks.push(graded);
        if !assignment.is_quiz() {
            marks.push(rubric);
        }
    }
    ReportRow {
        student: student.name.clone(),
        marks,
    }
}

/// Turns the aggregated table into a rectangular grid. `assignments` must be
/// in display (sorted) order; rows are ordered by student name.
pub fn build(assignments: &[Assignment], table: &GradeTable) -> GradeGrid {
    let columns = columns(assignments);

    let mut students: Vec<&StudentGrades> = table.students().collect();
    students.sort_by(|a, b| a.name.cmp(&b.name));

    let rows: Vec<ReportRow> = students
        .into_iter()
        .map(|student| row(student, assignments))
        .collect();

    debug_assert!(rows.iter().all(|r| r.marks.len() + 1 == columns.len()));

    GradeGrid { columns, rows }
}
