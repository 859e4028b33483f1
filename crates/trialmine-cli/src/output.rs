//! Output formatting for the CLI.

use crate::config::OutputFormat;
use crate::error::Result;
use colored::*;
use trialmine_domain::{
    CheckpointSummary, ComparisonResult, ExtractionCheckpoint, ExtractionStatus, MergedField,
    UnifiedRecord,
};
use trialmine_extractor::ExtractionOutcome;
use trialmine_reconcile::StudyComparison;
use tabled::{
    builder::Builder,
    settings::{object::Rows, Alignment, Modify, Style},
};

const VALUE_WIDTH: usize = 60;

/// Output formatter.
pub struct Formatter {
    format: OutputFormat,
    color_enabled: bool,
}

impl Formatter {
    /// Create a new formatter.
    pub fn new(format: OutputFormat, color_enabled: bool) -> Self {
        Self {
            format,
            color_enabled,
        }
    }

    /// Selected format.
    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// Format the result of an extract or resume run.
    pub fn format_outcome(&self, outcome: &ExtractionOutcome) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(outcome)?),
            OutputFormat::Quiet => Ok(progress_line(&outcome.checkpoint)),
            OutputFormat::Table => {
                let mut out = self.format_checkpoint_table(&outcome.checkpoint);
                out.push('\n');
                out.push_str(&self.info(&format!(
                    "{} {}: attempted {}, completed {}{}",
                    outcome.checkpoint.case_id,
                    outcome.checkpoint.document_type,
                    outcome.fields_attempted,
                    outcome.fields_completed,
                    if outcome.resumed { " (resumed)" } else { "" },
                )));
                if !outcome.comparisons.is_empty() {
                    out.push('\n');
                    out.push_str(&self.format_comparison_table(&outcome.comparisons));
                }
                out.push('\n');
                out.push_str(&self.progress(&outcome.checkpoint));
                Ok(out)
            }
        }
    }

    /// Format checkpoint summaries.
    pub fn format_summaries(&self, summaries: &[CheckpointSummary]) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(summaries)?),
            OutputFormat::Quiet => Ok(summaries
                .iter()
                .map(|s| format!("{}\t{}", s.case_id, s.document_type.key()))
                .collect::<Vec<_>>()
                .join("\n")),
            OutputFormat::Table => {
                if summaries.is_empty() {
                    return Ok(self.colorize("No checkpoints found.", "yellow"));
                }

                let mut builder = Builder::default();
                builder.push_record([
                    "Case", "Document", "Progress", "Completed", "Failed", "Skipped", "Total", "Updated",
                ]);
                for summary in summaries {
                    builder.push_record([
                        summary.case_id.clone(),
                        summary.document_type.to_string(),
                        format!("{:.0}%", summary.progress_percentage),
                        summary.completed_fields.to_string(),
                        summary.failed_fields.to_string(),
                        summary.skipped_fields.to_string(),
                        summary.total_fields.to_string(),
                        summary.last_update.format("%Y-%m-%d %H:%M").to_string(),
                    ]);
                }
                Ok(self.render(builder))
            }
        }
    }

    /// Format a merged case record.
    pub fn format_record(&self, record: &UnifiedRecord) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(record)?),
            OutputFormat::Quiet => Ok(format!(
                "{}\t{}/{}",
                record.case_id, record.statistics.extracted_fields, record.statistics.total_fields
            )),
            OutputFormat::Table => {
                let mut builder = Builder::default();
                builder.push_record(["Field", "Value", "Source"]);
                for (field, merged) in &record.fields {
                    let (value, source) = match merged {
                        MergedField::Resolved {
                            value,
                            source_document,
                            ..
                        } => (truncate(value), source_document.to_string()),
                        MergedField::Unresolved {
                            attempted_documents,
                            ..
                        } => (
                            "-".to_string(),
                            format!(
                                "tried {}",
                                attempted_documents
                                    .iter()
                                    .map(|d| d.as_str())
                                    .collect::<Vec<_>>()
                                    .join(", ")
                            ),
                        ),
                    };
                    builder.push_record([field.to_string(), value, source]);
                }

                let mut out = self.render(builder);
                out.push('\n');
                out.push_str(&self.info(&format!(
                    "{}: {}/{} fields ({:.0}%)",
                    record.case_id,
                    record.statistics.extracted_fields,
                    record.statistics.total_fields,
                    record.statistics.extraction_rate * 100.0
                )));
                Ok(out)
            }
        }
    }

    /// Format a comparison report.
    pub fn format_comparison(&self, comparison: &StudyComparison) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(comparison)?),
            OutputFormat::Quiet => Ok(format!(
                "{}\t{}/{}",
                comparison.case_id,
                comparison.matches(),
                comparison.results.len()
            )),
            OutputFormat::Table => {
                let mut out = self.format_comparison_table(&comparison.results);
                if !comparison.missing_in_extraction.is_empty() {
                    out.push('\n');
                    out.push_str(&self.warning(&format!(
                        "Not extracted: {}",
                        join_fields(&comparison.missing_in_extraction)
                    )));
                }
                if !comparison.missing_in_reference.is_empty() {
                    out.push('\n');
                    out.push_str(&self.info(&format!(
                        "No reference value: {}",
                        join_fields(&comparison.missing_in_reference)
                    )));
                }
                out.push('\n');
                let summary = format!(
                    "{}/{} fields match ({:.0}%)",
                    comparison.matches(),
                    comparison.results.len(),
                    comparison.accuracy() * 100.0
                );
                if comparison.mismatches() == 0 {
                    out.push_str(&self.success(&summary));
                } else {
                    out.push_str(&self.warning(&summary));
                }
                Ok(out)
            }
        }
    }

    fn format_checkpoint_table(&self, checkpoint: &ExtractionCheckpoint) -> String {
        let mut builder = Builder::default();
        builder.push_record(["Field", "Status", "Value", "Confidence", "Source / Error"]);
        for (field, extraction) in &checkpoint.fields {
            let detail = match extraction.status {
                ExtractionStatus::Failed => extraction.error_message.clone().unwrap_or_default(),
                _ => extraction.source_text.clone().unwrap_or_default(),
            };
            builder.push_record([
                field.to_string(),
                self.status(extraction.status),
                extraction.value.as_deref().map(truncate).unwrap_or_default(),
                extraction
                    .confidence
                    .map(|c| format!("{:.2}", c))
                    .unwrap_or_default(),
                detail,
            ]);
        }
        self.render(builder)
    }

    fn format_comparison_table(&self, results: &[ComparisonResult]) -> String {
        if results.is_empty() {
            return self.colorize("No comparable fields found.", "yellow");
        }

        let mut builder = Builder::default();
        builder.push_record(["Field", "Match", "Score", "Extracted", "Reference"]);
        for result in results {
            let verdict = if result.is_match {
                self.colorize("✓", "green")
            } else {
                self.colorize("✗", "red")
            };
            builder.push_record([
                result.field_name.to_string(),
                verdict,
                format!("{:.2}", result.similarity_score),
                truncate(&result.extracted_value),
                truncate(&result.reference_value),
            ]);
        }
        self.render(builder)
    }

    fn render(&self, builder: Builder) -> String {
        let mut table = builder.build();
        table
            .with(Style::rounded())
            .with(Modify::new(Rows::first()).with(Alignment::center()));
        table.to_string()
    }

    fn status(&self, status: ExtractionStatus) -> String {
        let color = match status {
            ExtractionStatus::Completed => "green",
            ExtractionStatus::Failed => "red",
            ExtractionStatus::Skipped => "cyan",
            ExtractionStatus::InProgress => "magenta",
            ExtractionStatus::Pending => "yellow",
        };
        self.colorize(status.as_str(), color)
    }

    /// Format a checkpoint's progress line.
    pub fn progress(&self, checkpoint: &ExtractionCheckpoint) -> String {
        let line = progress_line(checkpoint);
        if checkpoint.failed_fields == 0 {
            self.success(&line)
        } else {
            self.warning(&line)
        }
    }

    /// Format a success message.
    pub fn success(&self, message: &str) -> String {
        self.colorize(&format!("✓ {}", message), "green")
    }

    /// Format an error message.
    pub fn error(&self, message: &str) -> String {
        self.colorize(&format!("✗ {}", message), "red")
    }

    /// Format an info message.
    pub fn info(&self, message: &str) -> String {
        self.colorize(&format!("ℹ {}", message), "blue")
    }

    /// Format a warning message.
    pub fn warning(&self, message: &str) -> String {
        self.colorize(&format!("⚠ {}", message), "yellow")
    }

    /// Colorize text if color is enabled.
    fn colorize(&self, text: &str, color: &str) -> String {
        if !self.color_enabled {
            return text.to_string();
        }

        match color {
            "red" => text.red().to_string(),
            "green" => text.green().to_string(),
            "blue" => text.blue().to_string(),
            "yellow" => text.yellow().to_string(),
            "cyan" => text.cyan().to_string(),
            "magenta" => text.magenta().to_string(),
            _ => text.to_string(),
        }
    }
}

fn progress_line(checkpoint: &ExtractionCheckpoint) -> String {
    format!(
        "{} {}: {}/{} completed, {} failed, {} skipped ({:.0}%)",
        checkpoint.case_id,
        checkpoint.document_type,
        checkpoint.completed_fields,
        checkpoint.total_fields,
        checkpoint.failed_fields,
        checkpoint.skipped_fields,
        checkpoint.progress_percentage()
    )
}

fn join_fields(fields: &[trialmine_domain::FieldName]) -> String {
    fields
        .iter()
        .map(|f| f.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Cut long values for table cells, on a character boundary.
fn truncate(value: &str) -> String {
    let single_line = value.replace('\n', " ");
    if single_line.chars().count() <= VALUE_WIDTH {
        return single_line;
    }
    let cut: String = single_line.chars().take(VALUE_WIDTH - 1).collect();
    format!("{}…", cut)
}

#[cfg(test)]
mod tests {
    use super::*;
    use trialmine_domain::{DocumentType, FieldName, FieldUpdate};

    fn checkpoint() -> ExtractionCheckpoint {
        let mut checkpoint = ExtractionCheckpoint::new(
            "NCT01234567",
            "NCT01234567_Prot_000.txt",
            DocumentType::Protocol,
            &[FieldName::Sponsor, FieldName::Enrollment],
            "abc",
        );
        checkpoint
            .apply(FieldName::Sponsor, FieldUpdate::in_progress())
            .unwrap();
        checkpoint
            .apply(
                FieldName::Sponsor,
                FieldUpdate::completed("Acme Corp")
                    .with_confidence(1.0)
                    .with_source("full document"),
            )
            .unwrap();
        checkpoint
    }

    fn outcome() -> ExtractionOutcome {
        ExtractionOutcome {
            checkpoint: checkpoint(),
            resumed: false,
            fields_attempted: 2,
            fields_completed: 1,
            comparisons: Vec::new(),
        }
    }

    #[test]
    fn test_json_format() {
        let formatter = Formatter::new(OutputFormat::Json, false);
        let output = formatter.format_outcome(&outcome()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value["checkpoint"]["case_id"], "NCT01234567");
        assert_eq!(value["fields_completed"], 1);
    }

    #[test]
    fn test_quiet_format() {
        let formatter = Formatter::new(OutputFormat::Quiet, false);
        let output = formatter.format_outcome(&outcome()).unwrap();
        assert!(output.starts_with("NCT01234567 Protocol: 1/2 completed"));
        assert!(!output.contains('\n'));
    }

    #[test]
    fn test_table_format() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        let output = formatter.format_outcome(&outcome()).unwrap();
        assert!(output.contains("Acme Corp"));
        assert!(output.contains("completed"));
        assert!(output.contains("full document"));
    }

    #[test]
    fn test_empty_summaries() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        let output = formatter.format_summaries(&[]).unwrap();
        assert!(output.contains("No checkpoints found"));
    }

    #[test]
    fn test_summaries_quiet() {
        let formatter = Formatter::new(OutputFormat::Quiet, false);
        let output = formatter.format_summaries(&[checkpoint().summary()]).unwrap();
        assert_eq!(output, "NCT01234567\tprotocol");
    }

    #[test]
    fn test_comparison_summary_line() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        let comparison = StudyComparison {
            case_id: "NCT01234567".into(),
            document_type: Some(DocumentType::Protocol),
            results: vec![ComparisonResult {
                field_name: FieldName::Sponsor,
                extracted_value: "Acme Corp".into(),
                reference_value: "ACME Corporation".into(),
                is_match: true,
                similarity_score: 0.9,
                notes: String::new(),
            }],
            missing_in_extraction: vec![FieldName::Enrollment],
            missing_in_reference: Vec::new(),
        };
        let output = formatter.format_comparison(&comparison).unwrap();
        assert!(output.contains("1/1 fields match (100%)"));
        assert!(output.contains("Not extracted: enrollment"));
    }

    #[test]
    fn test_truncate_long_values() {
        let long = "x".repeat(200);
        let cut = truncate(&long);
        assert_eq!(cut.chars().count(), VALUE_WIDTH);
        assert!(cut.ends_with('…'));
        assert_eq!(truncate("a\nb"), "a b");
    }

    #[test]
    fn test_colorize_disabled() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        let msg = formatter.success("test");
        assert_eq!(msg, "✓ test");
    }
}
