use crate::models::{CourseReport, GradeGrid};
use anyhow::{Context, Result};
use chrono::Local;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Write one course grid to `dir/grading_{course_id}_{timestamp}.csv`.
pub fn export_grid_to_csv(grid: &GradeGrid, course_id: u64, dir: &Path) -> Result<PathBuf> {
    let timestamp = Local::now().format("%Y%m%d_%H%M%S");
    let filepath = dir.join(format!("grading_{}_{}.csv", course_id, timestamp));

    let mut wtr = csv::Writer::from_path(&filepath)
        .with_context(|| format!("Failed to create CSV file {}", filepath.display()))?;

    wtr.write_record(&grid.columns)
        .context("Failed to write CSV headers")?;

    for row in &grid.rows {
        wtr.write_record(row.to_record())
            .context("Failed to write CSV record")?;
    }

    wtr.flush().context("Failed to flush CSV writer")?;

    Ok(filepath)
}

/// Export every course that produced a table. Courses without one are skipped.
/// A course listed more than once is written once, from its first report.
pub fn export_reports(reports: &[CourseReport], dir: &Path) -> Result<Vec<PathBuf>> {
    let mut seen = HashSet::new();
    let exportable: Vec<(u64, &GradeGrid)> = reports
        .iter()
        .filter_map(|r| r.grid().map(|g| (r.course_id, g)))
        .filter(|(course_id, _)| seen.insert(*course_id))
        .collect();

    if exportable.is_empty() {
        anyhow::bail!("No course tables to export");
    }

    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create export directory {}", dir.display()))?;

    let mut paths = Vec::with_capacity(exportable.len());
    for (course_id, grid) in exportable {
        let path = export_grid_to_csv(grid, course_id, dir)?;
        tracing::info!(course_id, path = %path.display(), "Exported course grid");
        paths.push(path);
    }

    Ok(paths)
}
