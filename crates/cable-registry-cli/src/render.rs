//! Terminal rendering of semaphore reports.

use cable_registry_core::SemaphoreReport;
use tabled::{Table, Tabled};

#[derive(Tabled)]
struct SemaphoreRow {
    #[tabled(rename = "cable")]
    cable: u64,
    #[tabled(rename = "label")]
    label: String,
    #[tabled(rename = "tension [tf]")]
    tension_tf: String,
    #[tabled(rename = "Fu")]
    fu: String,
    #[tabled(rename = "% Fu")]
    pct_fu: String,
    #[tabled(rename = "status")]
    status: String,
}

/// Render a semaphore report as a table plus a one-line summary.
pub fn render_semaphore(report: &SemaphoreReport) -> String {
    let rows: Vec<SemaphoreRow> = report
        .entries
        .iter()
        .map(|e| SemaphoreRow {
            cable: e.cable_id.0,
            label: e.label.clone(),
            tension_tf: format!("{:.2}", e.tension_tf),
            fu: format!("{:.2}", e.fu),
            pct_fu: format!("{:.1}", e.pct_fu),
            status: e.status.to_string(),
        })
        .collect();

    let table = Table::new(rows).to_string();
    format!(
        "{table}\nthreshold: {:.1}% of Fu | cables: {} | alerts: {}",
        report.threshold_pct, report.total, report.exceeded
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use cable_registry_core::analysis::{SemaphoreEntry, SemaphoreStatus};
    use cable_registry_core::CableId;

    #[test]
    fn render_includes_rows_and_summary() {
        let report = SemaphoreReport {
            threshold_pct: 45.0,
            total: 2,
            exceeded: 1,
            entries: vec![SemaphoreEntry {
                cable_id: CableId(7),
                label: "T-07".to_string(),
                tension_tf: 90.0,
                fu: 150.0,
                pct_fu: 60.0,
                status: SemaphoreStatus::Alert,
            }],
        };

        let rendered = render_semaphore(&report);
        assert!(rendered.contains("T-07"));
        assert!(rendered.contains("ALERT"));
        assert!(rendered.contains("alerts: 1"));
    }
}
