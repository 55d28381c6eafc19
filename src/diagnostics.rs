//! Structured sink for recoverable anomalies met during a conversion.
//!
//! Every entry is also forwarded to `log::warn!`, so command-line users see
//! warnings as they happen while library callers get an ordered record back.

use std::fmt;

use serde::Serialize;

#[cfg(feature = "colorized_output")]
use console::style;

/// Kind of recoverable anomaly
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum DiagnosticKind {
    /// Reader serial not in the known table; molar conversion disabled
    UnknownInstrument,
    /// Channel label matched no known fluorophore
    UnknownChannelName,
    /// Well has no supplementary metadata; the reading was dropped
    MissingMetadata,
    /// No reaction volume given; 10 uL assumed
    DefaultVolume,
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DiagnosticKind::UnknownInstrument => "unknown instrument",
            DiagnosticKind::UnknownChannelName => "unknown channel name",
            DiagnosticKind::MissingMetadata => "missing metadata",
            DiagnosticKind::DefaultVolume => "default volume",
        };
        f.write_str(name)
    }
}

/// A single warning with the input it concerns
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnostic {
    /// What went wrong
    pub kind: DiagnosticKind,
    /// Human-readable explanation
    pub message: String,
    /// Offending value (serial, channel label, well id, ...)
    pub context: String,
}

/// Ordered list of diagnostics
#[derive(Debug, Clone, Default, Serialize)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    /// Create an empty sink
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a diagnostic and emit it as a warning
    pub fn push(&mut self, kind: DiagnosticKind, message: impl Into<String>, context: impl Into<String>) {
        let diagnostic = Diagnostic {
            kind,
            message: message.into(),
            context: context.into(),
        };
        log::warn!("{}", diagnostic.message);
        self.entries.push(diagnostic);
    }

    /// All entries in the order they were raised
    pub fn entries(&self) -> &[Diagnostic] {
        &self.entries
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when nothing was recorded
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of entries of one kind
    pub fn count(&self, kind: DiagnosticKind) -> usize {
        self.entries.iter().filter(|d| d.kind == kind).count()
    }

    /// Append every entry of `other`, without re-logging
    pub fn extend(&mut self, other: Diagnostics) {
        self.entries.extend(other.entries);
    }

    /// Serialize to pretty JSON for a report sidecar
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Format the summary with colors (requires console feature)
    pub fn format_colored(&self) -> String {
        #[cfg(feature = "colorized_output")]
        {
            let mut output = String::new();
            for d in &self.entries {
                output.push_str(&format!(
                    "[{}] {}\n",
                    style(d.kind.to_string()).yellow().bold(),
                    d.message
                ));
            }
            output.push_str(&format!(
                "{}: {} warnings\n",
                style("Summary").bold(),
                style(self.len()).yellow()
            ));
            output
        }

        #[cfg(not(feature = "colorized_output"))]
        {
            format!("{}", self)
        }
    }
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for d in &self.entries {
            writeln!(f, "[{}] {}", d.kind, d.message)?;
        }
        writeln!(f, "Summary: {} warnings", self.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_and_count() {
        let mut diags = Diagnostics::new();
        diags.push(DiagnosticKind::MissingMetadata, "No metadata for well B2", "B2");
        diags.push(DiagnosticKind::MissingMetadata, "No metadata for well B3", "B3");
        diags.push(DiagnosticKind::UnknownInstrument, "Unknown reader '42'", "42");

        assert_eq!(diags.len(), 3);
        assert_eq!(diags.count(DiagnosticKind::MissingMetadata), 2);
        assert_eq!(diags.count(DiagnosticKind::DefaultVolume), 0);
        assert_eq!(diags.entries()[2].context, "42");
    }

    #[test]
    fn test_json_report() {
        let mut diags = Diagnostics::new();
        diags.push(DiagnosticKind::UnknownChannelName, "Unrecognized channel 'Foo'", "Foo");
        let json = diags.to_json().unwrap();
        assert!(json.contains("UnknownChannelName"));
        assert!(json.contains("\"context\": \"Foo\""));
    }

    #[test]
    fn test_display_summary() {
        let diags = Diagnostics::new();
        assert_eq!(diags.to_string(), "Summary: 0 warnings\n");
    }
}
