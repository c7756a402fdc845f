/*!
 * Reporting functionality for filekit
 *
 * Renders batch results, metadata snapshots and disk space checks as
 * console tables using the tabled library.
 */

use std::time::{Duration, UNIX_EPOCH};

use chrono::Local;
use filetime::FileTime;
use tabled::{
    settings::{object::Columns, Alignment, Modify, Padding, Style},
    Table, Tabled,
};

use crate::disk::{format_bytes, DiskUsage, SpaceCheck};
use crate::metadata::{MetadataSnapshot, PlatformExtra};
use crate::transfer::{BatchReport, Operation};

/// Summary of a finished batch run
#[derive(Debug, Clone)]
pub struct BatchSummary<'a> {
    pub operation: Operation,
    pub report: &'a BatchReport,
    pub duration: Duration,
}

/// Format of the report output
pub enum ReportFormat {
    /// Console table output
    ConsoleTable,
}

/// Report generator for filekit commands
pub struct Reporter {
    format: ReportFormat,
}

#[derive(Tabled)]
struct KeyValueRow {
    #[tabled(rename = "Metric")]
    key: String,

    #[tabled(rename = "Value")]
    value: String,
}

fn row(key: &str, value: String) -> KeyValueRow {
    KeyValueRow {
        key: key.to_string(),
        value,
    }
}

fn render<T: Tabled>(rows: Vec<T>) -> String {
    let mut table = Table::new(rows);
    table
        .with(Style::rounded())
        .with(Padding::new(1, 1, 0, 0))
        .with(Modify::new(Columns::new(..)).with(Alignment::left()));
    table.to_string()
}

fn format_time(time: FileTime) -> String {
    let Ok(seconds) = u64::try_from(time.unix_seconds()) else {
        return "-".to_string();
    };
    let system = UNIX_EPOCH + Duration::new(seconds, time.nanoseconds());
    chrono::DateTime::<Local>::from(system)
        .format("%Y-%m-%d %H:%M:%S")
        .to_string()
}

impl Reporter {
    /// Create a new reporter
    pub fn new(format: ReportFormat) -> Self {
        Self { format }
    }

    // Keep the last path segments that fit in max_len
    fn format_path(&self, path: &str, max_len: usize) -> String {
        if path.chars().count() <= max_len {
            return path.to_string();
        }

        let separator = if path.contains('\\') { '\\' } else { '/' };
        let mut segments = Vec::new();
        let mut current_len = 3; // "..."

        for part in path.rsplit(separator) {
            let part_len = part.chars().count() + 1;
            if current_len + part_len > max_len {
                break;
            }
            segments.push(part);
            current_len += part_len;
        }

        if segments.is_empty() {
            let tail: String = path
                .chars()
                .rev()
                .take(max_len.saturating_sub(3))
                .collect::<Vec<_>>()
                .into_iter()
                .rev()
                .collect();
            return format!("...{}", tail);
        }

        let mut result = String::from("...");
        for part in segments.iter().rev() {
            result.push(separator);
            result.push_str(part);
        }
        result
    }

    fn create_results_table(&self, report: &BatchReport) -> String {
        #[derive(Tabled)]
        struct ResultRow {
            #[tabled(rename = "Source")]
            source: String,

            #[tabled(rename = "Destination")]
            destination: String,

            #[tabled(rename = "Status")]
            status: String,
        }

        let rows: Vec<ResultRow> = report
            .iter()
            .map(|(source, result)| ResultRow {
                source: self.format_path(&source.display().to_string(), 50),
                destination: if result.success {
                    self.format_path(&result.destination.display().to_string(), 50)
                } else {
                    "-".to_string()
                },
                status: if result.success { "✅ ok" } else { "❌ failed" }.to_string(),
            })
            .collect();

        render(rows)
    }

    fn create_summary_table(&self, summary: &BatchSummary<'_>) -> String {
        render(vec![
            row("🔧 Operation", summary.operation.to_string()),
            row("⏱️ Process Time", format!("{:.4?}", summary.duration)),
            row("✅ Succeeded", summary.report.succeeded().to_string()),
            row("❌ Failed", summary.report.failed().to_string()),
            row("📄 Total", summary.report.len().to_string()),
        ])
    }

    /// Report string for a batch run
    pub fn batch_report(&self, summary: &BatchSummary<'_>) -> String {
        match self.format {
            ReportFormat::ConsoleTable => format!(
                "📋  TRANSFERRED FILES\n{}\n\n✅  {} COMPLETE\n{}",
                self.create_results_table(summary.report),
                summary.operation.to_string().to_uppercase(),
                self.create_summary_table(summary)
            ),
        }
    }

    /// Report string for a metadata snapshot
    pub fn metadata_report(&self, path: &str, snapshot: &MetadataSnapshot) -> String {
        let mut rows = vec![row("📂 Path", path.to_string())];

        rows.push(row(
            "🔒 Mode",
            snapshot
                .mode
                .map(|mode| format!("{:o}", mode))
                .unwrap_or_else(|| "-".to_string()),
        ));

        if let Some(timestamps) = &snapshot.timestamps {
            rows.push(row("👁️ Accessed", format_time(timestamps.accessed)));
            rows.push(row("✏️ Modified", format_time(timestamps.modified)));
            rows.push(row(
                "🕐 Created",
                timestamps
                    .created
                    .map(format_time)
                    .unwrap_or_else(|| "-".to_string()),
            ));
        }

        let extra = match &snapshot.platform_extra {
            PlatformExtra::Empty => "-".to_string(),
            PlatformExtra::Owner { uid, gid } => format!("uid {} / gid {}", uid, gid),
            PlatformExtra::Attributes { bits } => format!("attributes {:#x}", bits),
            PlatformExtra::AttribListing { listing } => format!("attrib: {}", listing),
        };
        rows.push(row("🏷️ Platform", extra));

        match self.format {
            ReportFormat::ConsoleTable => render(rows),
        }
    }

    /// Report string for a disk space check
    pub fn space_report(&self, path: &str, usage: &DiskUsage, check: Option<&SpaceCheck>) -> String {
        let mut rows = vec![
            row("📂 Path", path.to_string()),
            row("💽 Total", format_bytes(usage.total)),
            row(
                "📦 Used",
                format!("{} ({:.1}%)", format_bytes(usage.used), usage.used_percent()),
            ),
            row(
                "🆓 Free",
                format!("{} ({:.1}%)", format_bytes(usage.free), usage.free_percent()),
            ),
        ];

        if let Some(check) = check {
            rows.push(row("📏 Required", format_bytes(check.required_with_margin)));
            rows.push(row(
                "✅ Fits",
                if check.has_space { "yes" } else { "no" }.to_string(),
            ));
        }

        match self.format {
            ReportFormat::ConsoleTable => render(rows),
        }
    }

    /// Print the batch report to stdout
    pub fn print_batch_report(&self, summary: &BatchSummary<'_>) {
        println!("\n{}", self.batch_report(summary));
    }
}
