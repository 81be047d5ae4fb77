use chrono::{DateTime, Datelike, Local};

use crate::commands::user_error;
use crate::models::{CaseFile, DashboardStats, Direction, MonthlyCaseCount};
use crate::services::state::AppState;

const MONTH_LABELS: [&str; 12] = [
    "Jan", "Fév", "Mar", "Avr", "Mai", "Jun", "Jul", "Août", "Sep", "Oct", "Nov", "Déc",
];

pub async fn get_dashboard_stats(year: Option<i32>, state: &AppState) -> Result<DashboardStats, String> {
    let year = year.unwrap_or_else(|| Local::now().year());

    let db = state.db.lock().map_err(|_| "DB lock".to_string())?;
    let case_files = db
        .list_case_files()
        .map_err(|e| user_error("get_dashboard_stats", e))?;
    let invoiced_total = db
        .invoiced_total()
        .map_err(|e| user_error("get_dashboard_stats", e))?;

    let imports = count_direction(case_files.iter(), Direction::Import);
    let exports = count_direction(case_files.iter(), Direction::Export);

    Ok(DashboardStats {
        year,
        total_case_files: case_files.len(),
        imports,
        exports,
        invoiced_total,
        monthly: build_monthly_series(&case_files, year),
    })
}

fn count_direction<'a>(case_files: impl Iterator<Item = &'a CaseFile>, direction: Direction) -> usize {
    case_files.filter(|c| c.direction == direction).count()
}

/// Per-month counts of case files created during `year`. Case files with an
/// unreadable creation date are left out.
pub fn build_monthly_series(case_files: &[CaseFile], year: i32) -> Vec<MonthlyCaseCount> {
    let created: Vec<(u32, Direction)> = case_files
        .iter()
        .filter_map(|case_file| {
            let raw = case_file.created_at.as_deref()?;
            let date = DateTime::parse_from_rfc3339(raw).ok()?.with_timezone(&Local);
            (date.year() == year).then(|| (date.month0(), case_file.direction))
        })
        .collect();

    MONTH_LABELS
        .iter()
        .enumerate()
        .map(|(index, label)| {
            let in_month: Vec<Direction> = created
                .iter()
                .filter(|(month, _)| *month as usize == index)
                .map(|(_, direction)| *direction)
                .collect();
            MonthlyCaseCount {
                month: label.to_string(),
                total: in_month.len(),
                imports: in_month.iter().filter(|d| **d == Direction::Import).count(),
                exports: in_month.iter().filter(|d| **d == Direction::Export).count(),
            }
        })
        .collect()
}
