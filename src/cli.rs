use crate::api::CanvasClient;
use crate::export;
use crate::fetcher;
use crate::models::{CourseBody, CourseReport, RubricPresence};
use crate::parser;
use anyhow::Result;
use clap::Parser;
use std::fmt::Write as _;
use std::path::PathBuf;
use std::time::Instant;

/// Audit Canvas courses for ungraded or rubric-less submissions.
///
/// Without `--courses` the interactive terminal UI starts.
#[derive(Debug, Parser)]
#[command(version, about)]
pub struct Args {
    /// Course IDs separated by comma, space or newline; runs headless
    #[arg(short, long)]
    pub courses: Option<String>,

    /// Directory to write one CSV per course (headless mode only)
    #[arg(short, long)]
    pub export: Option<PathBuf>,
}

pub async fn run(client: &CanvasClient, courses: &str, export_dir: Option<PathBuf>) -> Result<()> {
    let course_ids = parser::parse_course_ids(courses);
    if course_ids.is_empty() {
        anyhow::bail!("Please enter at least one valid course ID");
    }

    let started = Instant::now();
    let reports = fetcher::run_audit(client, &course_ids, None).await;

    for report in &reports {
        println!("{}", render_text(report));
    }

    if let Some(dir) = export_dir {
        for path in export::export_reports(&reports, &dir)? {
            println!("Exported {}", path.display());
        }
    }

    println!("Elapsed: {:.2} s", started.elapsed().as_secs_f64());
    Ok(())
}

/// Plain-text rendering of one course report.
pub fn render_text(report: &CourseReport) -> String {
    let mut out = String::new();
    out.push_str(&"-".repeat(60));
    out.push('\n');

    match &report.header {
        Some(header) => {
            let account_id = header
                .course
                .account_id
                .map(|id| id.to_string())
                .unwrap_or_else(|| "-".to_string());
            let _ = writeln!(out, "Sub-account: {} (ID: {})", header.sub_account_name, account_id);
            let _ = writeln!(out, "Course: {} (ID: {})", header.course.display_name(), report.course_id);
            let _ = writeln!(out, "Version: {}", header.course.course_code.as_deref().unwrap_or(""));
            let _ = writeln!(out, "Code: {}", header.course.display_sis_id());
        }
        None => {
            let _ = writeln!(out, "Course {}: information unavailable", report.course_id);
        }
    }

    for issue in &report.issues {
        let _ = writeln!(out, "! {}", issue);
    }

    let (massive, rubric_summary, grid) = match &report.body {
        CourseBody::NoAssignments => {
            let _ = writeln!(
                out,
                "No assignments found or the API query failed for course {}.",
                report.course_id
            );
            return out;
        }
        CourseBody::Table {
            massive,
            rubric_summary,
            grid,
        } => (*massive, rubric_summary, grid),
    };

    if massive {
        out.push_str("CURSO MASIVO\n");
    }

    for line in rubric_summary {
        let label = match line.presence {
            RubricPresence::Massive => "ES MASIVO",
            RubricPresence::Present => "Sí",
            RubricPresence::Missing => "No",
        };
        let _ = writeln!(out, "- {}: ¿Tiene rúbrica asociada? {}", line.assignment, label);
    }

    let records: Vec<Vec<String>> = grid.rows.iter().map(|r| r.to_record()).collect();
    let widths: Vec<usize> = grid
        .columns
        .iter()
        .enumerate()
        .map(|(i, column)| {
            records
                .iter()
                .map(|r| r[i].chars().count())
                .chain(std::iter::once(column.chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let mut push_line = |cells: &[String]| {
        let line: Vec<String> = cells
            .iter()
            .zip(&widths)
            .map(|(cell, width)| format!("{:<width$}", cell, width = width))
            .collect();
        let _ = writeln!(out, "{}", line.join(" | ").trim_end());
    };

    push_line(&grid.columns);
    for record in &records {
        push_line(record);
    }

    out
}
