/*!
 * Reporting functionality for cliptree
 *
 * Summarizes what was copied using the tabled library for clean,
 * consistent table rendering.
 */

use std::time::Duration;

use tabled::{
    settings::{object::Columns, Alignment, Modify, Padding, Style},
    Table, Tabled,
};

use crate::utils::format_file_size;

/// Information about a file in the report
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileReportInfo {
    /// Number of lines in the file
    pub lines: usize,
    /// Number of characters in the file
    pub chars: usize,
}

/// Statistics for one run
#[derive(Debug, Clone, Default)]
pub struct CopyReport {
    /// Where the payload went
    pub destination: String,
    /// Time taken end to end
    pub duration: Duration,
    /// Files whose content made it into the payload
    pub files_copied: usize,
    /// Files left out as binary
    pub skipped_binary: usize,
    /// Files that could not be read
    pub unreadable: usize,
    /// Directories whose children could not be listed
    pub unreadable_dirs: usize,
    /// Requested paths that were skipped
    pub missing_roots: usize,
    /// Ignore patterns that failed to compile
    pub rejected_patterns: usize,
    /// Total number of lines
    pub total_lines: usize,
    /// Total number of characters
    pub total_chars: usize,
    /// Size of the payload in bytes
    pub payload_bytes: usize,
    /// Per-file details, keyed by tag, in payload order
    pub file_details: Vec<(String, FileReportInfo)>,
}

/// Format of the report output
pub enum ReportFormat {
    /// Console table output
    ConsoleTable,
}

/// Report generator for copy results
pub struct Reporter {
    format: ReportFormat,
}

impl Reporter {
    /// Create a new reporter
    pub fn new(format: ReportFormat) -> Self {
        Self { format }
    }

    /// Format a number with human-readable units
    fn format_number(&self, num: usize) -> String {
        if num >= 1_000_000 {
            format!("{:.1}M", num as f64 / 1_000_000.0)
        } else if num >= 1_000 {
            format!("{:.1}K", num as f64 / 1_000.0)
        } else {
            num.to_string()
        }
    }

    /// Generate a report string
    pub fn generate_report(&self, report: &CopyReport) -> String {
        match self.format {
            ReportFormat::ConsoleTable => self.generate_console_report(report),
        }
    }

    /// Print the report to stderr, keeping stdout free for the payload
    pub fn print_report(&self, report: &CopyReport) {
        eprintln!("\n{}", self.generate_report(report));
    }

    // Keep the tail of long paths, where the file name is
    fn format_path(&self, path: &str, max_len: usize) -> String {
        if path.chars().count() <= max_len {
            return path.to_string();
        }

        let mut segments = Vec::new();
        let mut current_len = 3; // "..."
        for part in path.split('/').rev() {
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
            result.push('/');
            result.push_str(part);
        }
        result
    }

    fn create_summary_table(&self, report: &CopyReport) -> String {
        #[derive(Tabled)]
        struct SummaryRow {
            #[tabled(rename = "Metric")]
            key: String,

            #[tabled(rename = "Value")]
            value: String,
        }

        let mut rows = vec![
            SummaryRow {
                key: "📋 Destination".to_string(),
                value: report.destination.clone(),
            },
            SummaryRow {
                key: "⏱️ Process Time".to_string(),
                value: format!("{:.4?}", report.duration),
            },
            SummaryRow {
                key: "📄 Files Copied".to_string(),
                value: self.format_number(report.files_copied),
            },
        ];

        if report.skipped_binary > 0 {
            rows.push(SummaryRow {
                key: "🚫 Binary Files Skipped".to_string(),
                value: self.format_number(report.skipped_binary),
            });
        }
        if report.unreadable > 0 {
            rows.push(SummaryRow {
                key: "⚠️ Unreadable Files".to_string(),
                value: self.format_number(report.unreadable),
            });
        }
        if report.unreadable_dirs > 0 {
            rows.push(SummaryRow {
                key: "🔒 Unreadable Directories".to_string(),
                value: self.format_number(report.unreadable_dirs),
            });
        }
        if report.missing_roots > 0 {
            rows.push(SummaryRow {
                key: "❓ Skipped Paths".to_string(),
                value: self.format_number(report.missing_roots),
            });
        }
        if report.rejected_patterns > 0 {
            rows.push(SummaryRow {
                key: "⚠️ Invalid Patterns".to_string(),
                value: self.format_number(report.rejected_patterns),
            });
        }

        rows.push(SummaryRow {
            key: "📝 Total Lines".to_string(),
            value: self.format_number(report.total_lines),
        });
        rows.push(SummaryRow {
            key: "📦 Payload Size".to_string(),
            value: format_file_size(report.payload_bytes as u64),
        });
        rows.push(SummaryRow {
            key: "🔢 LLM Tokens".to_string(),
            value: format!(
                "{} tokens (estimated)",
                self.format_number(report.total_chars / 4)
            ),
        });

        let mut table = Table::new(rows);
        table
            .with(Style::rounded())
            .with(Padding::new(1, 1, 0, 0))
            .with(Modify::new(Columns::new(..)).with(Alignment::left()));

        table.to_string()
    }

    fn create_files_table(&self, report: &CopyReport) -> String {
        #[derive(Tabled)]
        struct FileRow {
            #[tabled(rename = "File Path")]
            path: String,

            #[tabled(rename = "Lines")]
            lines: String,

            #[tabled(rename = "Est. Tokens")]
            tokens: String,
        }

        let mut files: Vec<_> = report.file_details.iter().collect();
        files.sort_by(|(_, a), (_, b)| b.chars.cmp(&a.chars));
        if files.len() > 15 {
            files.truncate(10);
        }

        let rows: Vec<FileRow> = files
            .iter()
            .map(|(path, info)| FileRow {
                path: self.format_path(path, 60),
                lines: self.format_number(info.lines),
                tokens: self.format_number(info.chars / 4),
            })
            .collect();

        let mut table = Table::new(rows);
        table
            .with(Style::rounded())
            .with(Padding::new(1, 1, 0, 0))
            .with(Modify::new(Columns::new(..)).with(Alignment::left()));

        table.to_string()
    }

    fn generate_console_report(&self, report: &CopyReport) -> String {
        let summary_table = self.create_summary_table(report);
        let files_table = self.create_files_table(report);

        let summary_title = "✅  COPY COMPLETE";
        let files_title = if report.file_details.len() > 15 {
            "📋  TOP 10 LARGEST FILES BY CHARACTER COUNT  📋"
        } else {
            "📋  COPIED FILES"
        };

        format!(
            "{}\n{}\n\n{}\n{}",
            files_title, files_table, summary_title, summary_table
        )
    }
}
