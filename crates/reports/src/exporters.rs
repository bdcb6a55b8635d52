//! Report exporters - CSV, JSON, Markdown
//!
//! Every report implements [`ReportData`]; an exporter turns it into text.

use std::fmt;

/// Trait for exporting reports to different formats
pub trait ReportExporter {
    /// Export to the target format
    fn export(&self, report: &dyn ReportData) -> String;

    /// Get the file extension for this format
    fn extension(&self) -> &'static str;

    /// Get the MIME type for this format
    fn mime_type(&self) -> &'static str;
}

/// Trait for data that can be exported
pub trait ReportData {
    /// Get the report title
    fn title(&self) -> &str;

    /// Get column headers
    fn headers(&self) -> Vec<String>;

    /// Get data rows
    fn rows(&self) -> Vec<Vec<String>>;

    /// Get summary statistics as key-value pairs
    fn summary(&self) -> Vec<(String, String)>;
}

/// Output format chosen on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReportFormat {
    Csv,
    Json,
    #[default]
    Markdown,
}

impl ReportFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportFormat::Csv => "csv",
            ReportFormat::Json => "json",
            ReportFormat::Markdown => "markdown",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "csv" => Some(ReportFormat::Csv),
            "json" => Some(ReportFormat::Json),
            "markdown" | "md" => Some(ReportFormat::Markdown),
            _ => None,
        }
    }

    /// Exporter with default settings for this format
    pub fn exporter(&self) -> Box<dyn ReportExporter> {
        match self {
            ReportFormat::Csv => Box::new(CsvExporter::new()),
            ReportFormat::Json => Box::new(JsonExporter::new()),
            ReportFormat::Markdown => Box::new(MarkdownExporter::new()),
        }
    }
}

impl fmt::Display for ReportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// CSV Exporter
// ============================================================================

/// CSV format exporter
pub struct CsvExporter {
    delimiter: char,
    include_header: bool,
}

impl Default for CsvExporter {
    fn default() -> Self {
        Self {
            delimiter: ',',
            include_header: true,
        }
    }
}

impl CsvExporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Semicolon is what spreadsheet tools expect in comma-decimal locales
    pub fn with_delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = delimiter;
        self
    }

    pub fn without_header(mut self) -> Self {
        self.include_header = false;
        self
    }

    fn escape_field(&self, field: &str) -> String {
        let needs_quotes = field.contains(self.delimiter)
            || field.contains('"')
            || field.contains('\n')
            || field.contains('\r');
        if needs_quotes {
            format!("\"{}\"", field.replace('"', "\"\""))
        } else {
            field.to_string()
        }
    }

    fn line(&self, fields: &[String]) -> String {
        let escaped: Vec<String> = fields.iter().map(|f| self.escape_field(f)).collect();
        let mut line = escaped.join(&self.delimiter.to_string());
        line.push('\n');
        line
    }
}

impl ReportExporter for CsvExporter {
    fn export(&self, report: &dyn ReportData) -> String {
        let mut output = String::new();
        if self.include_header {
            output.push_str(&self.line(&report.headers()));
        }
        for row in report.rows() {
            output.push_str(&self.line(&row));
        }
        output
    }

    fn extension(&self) -> &'static str {
        "csv"
    }

    fn mime_type(&self) -> &'static str {
        "text/csv"
    }
}

// ============================================================================
// JSON Exporter
// ============================================================================

/// JSON format exporter
pub struct JsonExporter {
    pretty: bool,
}

impl Default for JsonExporter {
    fn default() -> Self {
        Self { pretty: true }
    }
}

impl JsonExporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn compact(mut self) -> Self {
        self.pretty = false;
        self
    }
}

impl ReportExporter for JsonExporter {
    fn export(&self, report: &dyn ReportData) -> String {
        let headers = report.headers();

        let rows: Vec<serde_json::Value> = report
            .rows()
            .into_iter()
            .map(|row| {
                let obj: serde_json::Map<String, serde_json::Value> = headers
                    .iter()
                    .cloned()
                    .zip(row.into_iter().map(serde_json::Value::String))
                    .collect();
                serde_json::Value::Object(obj)
            })
            .collect();

        let summary: serde_json::Map<String, serde_json::Value> = report
            .summary()
            .into_iter()
            .map(|(k, v)| (k, serde_json::Value::String(v)))
            .collect();

        let output = serde_json::json!({
            "title": report.title(),
            "summary": summary,
            "data": rows,
        });

        let rendered = if self.pretty {
            serde_json::to_string_pretty(&output)
        } else {
            serde_json::to_string(&output)
        };
        // a Value built from strings always serializes
        rendered.unwrap_or_default()
    }

    fn extension(&self) -> &'static str {
        "json"
    }

    fn mime_type(&self) -> &'static str {
        "application/json"
    }
}

// ============================================================================
// Markdown Exporter
// ============================================================================

/// Markdown format exporter
pub struct MarkdownExporter {
    include_summary: bool,
}

impl Default for MarkdownExporter {
    fn default() -> Self {
        Self {
            include_summary: true,
        }
    }
}

impl MarkdownExporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn without_summary(mut self) -> Self {
        self.include_summary = false;
        self
    }

    fn cell(value: &str) -> String {
        value.replace('|', "\\|").replace('\n', " ")
    }

    fn table_row(cells: &[String]) -> String {
        let cells: Vec<String> = cells.iter().map(|c| Self::cell(c)).collect();
        format!("| {} |\n", cells.join(" | "))
    }
}

impl ReportExporter for MarkdownExporter {
    fn export(&self, report: &dyn ReportData) -> String {
        let mut output = format!("# {}\n\n", report.title());

        if self.include_summary {
            let summary = report.summary();
            if !summary.is_empty() {
                output.push_str("## Summary\n\n");
                for (key, value) in summary {
                    output.push_str(&format!("- **{}**: {}\n", key, value));
                }
                output.push('\n');
            }
        }

        output.push_str("## Data\n\n");
        let headers = report.headers();
        if headers.is_empty() {
            return output;
        }
        let rows = report.rows();
        if rows.is_empty() {
            output.push_str("_No data._\n");
            return output;
        }

        output.push_str(&Self::table_row(&headers));
        output.push_str(&format!("|{}\n", " --- |".repeat(headers.len())));
        for row in rows {
            output.push_str(&Self::table_row(&row));
        }
        output
    }

    fn extension(&self) -> &'static str {
        "md"
    }

    fn mime_type(&self) -> &'static str {
        "text/markdown"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Sample {
        rows: Vec<Vec<String>>,
    }

    impl ReportData for Sample {
        fn title(&self) -> &str {
            "Sample"
        }

        fn headers(&self) -> Vec<String> {
            vec!["Client".to_string(), "Amount".to_string()]
        }

        fn rows(&self) -> Vec<Vec<String>> {
            self.rows.clone()
        }

        fn summary(&self) -> Vec<(String, String)> {
            vec![("Total".to_string(), "1300.00".to_string())]
        }
    }

    fn sample() -> Sample {
        Sample {
            rows: vec![
                vec!["Maria Souza".to_string(), "1000.00".to_string()],
                vec!["Silva, João \"Jão\"".to_string(), "300.00".to_string()],
            ],
        }
    }

    #[test]
    fn test_csv_exporter() {
        let output = CsvExporter::new().export(&sample());
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines[0], "Client,Amount");
        assert_eq!(lines[1], "Maria Souza,1000.00");
        assert_eq!(lines[2], "\"Silva, João \"\"Jão\"\"\",300.00");
    }

    #[test]
    fn test_csv_semicolon_without_header() {
        let output = CsvExporter::new()
            .with_delimiter(';')
            .without_header()
            .export(&sample());
        assert!(output.starts_with("Maria Souza;1000.00\n"));
    }

    #[test]
    fn test_json_exporter() {
        let output = JsonExporter::new().compact().export(&sample());
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value["title"], "Sample");
        assert_eq!(value["summary"]["Total"], "1300.00");
        assert_eq!(value["data"][0]["Client"], "Maria Souza");
        assert_eq!(value["data"][1]["Amount"], "300.00");
    }

    #[test]
    fn test_markdown_exporter() {
        let output = MarkdownExporter::new().export(&sample());
        assert!(output.contains("# Sample"));
        assert!(output.contains("- **Total**: 1300.00"));
        assert!(output.contains("| Client | Amount |"));
        assert!(output.contains("| --- | --- |"));
        assert!(output.contains("| Maria Souza | 1000.00 |"));
    }

    #[test]
    fn test_markdown_empty_rows() {
        let output = MarkdownExporter::new()
            .without_summary()
            .export(&Sample { rows: Vec::new() });
        assert!(!output.contains("## Summary"));
        assert!(output.contains("_No data._"));
    }

    #[test]
    fn test_report_format_parsing() {
        assert_eq!(ReportFormat::from_str("CSV"), Some(ReportFormat::Csv));
        assert_eq!(ReportFormat::from_str("md"), Some(ReportFormat::Markdown));
        assert_eq!(ReportFormat::from_str("pdf"), None);
        assert_eq!(ReportFormat::Json.exporter().extension(), "json");
    }
}
