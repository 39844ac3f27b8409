use crate::core::report::{ActivityReport, DateRangeReport, EngagementTotals, PostStat, PostsAnalysis};
use crate::domain::ports::Storage;
use crate::utils::error::{EtlError, Result};
use serde::Serialize;
use std::io::Write;
use zip::write::{FileOptions, ZipWriter};

/// 報表輸出：CSV + TSV + JSON 打包成一個 ZIP
pub struct ReportExporter<S: Storage> {
    storage: S,
}

struct Table {
    header: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl<S: Storage> ReportExporter<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    pub async fn export_activity(&self, report: &ActivityReport) -> Result<String> {
        let mut header = vec!["employee".to_string(), "profile".to_string()];
        header.extend(report.post_dates.iter().cloned());
        header.extend(["likes", "reposts", "total"].map(String::from));

        let rows = report
            .records
            .iter()
            .map(|record| {
                let stats = record.stats();
                let mut row = vec![record.employee.name.clone(), record.employee.url.clone()];
                row.extend(record.marks().iter().map(|m| m.to_string()));
                row.push(stats.likes().to_string());
                row.push(stats.reposts().to_string());
                row.push(stats.total().to_string());
                row
            })
            .collect();

        let file_name = format!("employee_activity_{}.zip", report.count);
        self.write_bundle(&file_name, "activity", &Table { header, rows }, report)
            .await
    }

    pub async fn export_posts(&self, report: &PostsAnalysis) -> Result<String> {
        let table = post_table(&report.stats, &[("total", report.totals)]);
        let file_name = format!("posts_analysis_{}.zip", report.count);
        self.write_bundle(&file_name, "posts", &table, report).await
    }

    pub async fn export_range(&self, report: &DateRangeReport) -> Result<String> {
        let table = post_table(
            &report.stats,
            &[("total", report.totals), ("average", report.averages)],
        );
        let period: String = report
            .period
            .chars()
            .map(|c| if c.is_ascii_digit() { c } else { '_' })
            .collect();
        let file_name = format!("date_range_{}.zip", period.trim_matches('_'));
        self.write_bundle(&file_name, "range", &table, report).await
    }

    async fn write_bundle<T: Serialize>(
        &self,
        file_name: &str,
        stem: &str,
        table: &Table,
        report: &T,
    ) -> Result<String> {
        let csv_output = render_table(table, b',')?;
        let tsv_output = render_table(table, b'\t')?;
        let json_output = serde_json::to_string_pretty(report)?;

        let zip_data = {
            let mut zip = ZipWriter::new(std::io::Cursor::new(Vec::new()));
            for (ext, content) in [
                ("csv", csv_output.as_bytes()),
                ("tsv", tsv_output.as_bytes()),
                ("json", json_output.as_bytes()),
            ] {
                zip.start_file::<_, ()>(format!("{}.{}", stem, ext), FileOptions::default())?;
                zip.write_all(content)?;
            }
            zip.finish()?.into_inner()
        };

        tracing::debug!("Writing {} ({} bytes) to storage", file_name, zip_data.len());
        self.storage.write_file(file_name, &zip_data).await?;
        tracing::info!("📁 Report saved as {}", file_name);
        Ok(file_name.to_string())
    }
}

fn post_table(stats: &[PostStat], summaries: &[(&str, EngagementTotals)]) -> Table {
    let header = ["date", "link", "text", "views", "likes", "reposts", "comments"]
        .map(String::from)
        .to_vec();

    let mut rows: Vec<Vec<String>> = stats
        .iter()
        .map(|s| {
            vec![
                s.date.clone(),
                s.link.clone(),
                s.text.clone(),
                s.views.to_string(),
                s.likes.to_string(),
                s.reposts.to_string(),
                s.comments.to_string(),
            ]
        })
        .collect();

    for (label, totals) in summaries {
        rows.push(vec![
            label.to_string(),
            String::new(),
            String::new(),
            totals.views.to_string(),
            totals.likes.to_string(),
            totals.reposts.to_string(),
            totals.comments.to_string(),
        ]);
    }

    Table { header, rows }
}

fn render_table(table: &Table, delimiter: u8) -> Result<String> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .from_writer(Vec::new());
    writer.write_record(&table.header)?;
    for row in &table.rows {
        writer.write_record(row)?;
    }
    let bytes = writer.into_inner().map_err(|e| EtlError::ProcessingError {
        message: format!("failed to flush table: {}", e),
    })?;
    String::from_utf8(bytes).map_err(|e| EtlError::ProcessingError {
        message: format!("table is not valid UTF-8: {}", e),
    })
}
