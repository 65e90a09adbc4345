use std::collections::BTreeMap;

use irforge_contracts::IRFORGE_DIAG_SCHEMA_VERSION;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Info,
    Hint,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Parse,
    Resolve,
    Check,
    Lower,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Location {
    Text {
        span: Span,
        #[serde(skip_serializing_if = "Option::is_none")]
        snippet: Option<String>,
    },
    Decl {
        id: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub start: Position,
    pub end: Position,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub line: u32,
    pub col: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quickfix {
    pub kind: QuickfixKind,
    pub edits: Vec<TextEdit>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuickfixKind {
    TextEdit,
}

/// Replace the bytes `start..end` of the input with `replacement`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextEdit {
    pub start: u64,
    pub end: u64,
    pub replacement: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub code: String,
    pub severity: Severity,
    pub stage: Stage,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub loc: Option<Location>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub related: Vec<Location>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub data: BTreeMap<String, Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quickfix: Option<Quickfix>,
}

impl Diagnostic {
    /// Byte offset the diagnostic starts at, if it points into source text.
    pub fn start_offset(&self) -> Option<u64> {
        match &self.loc {
            Some(Location::Text { span, .. }) => span.start.offset,
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Report {
    pub schema_version: String,
    pub ok: bool,
    pub diagnostics: Vec<Diagnostic>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub meta: BTreeMap<String, Value>,
}

impl Report {
    pub fn ok() -> Self {
        Self {
            schema_version: IRFORGE_DIAG_SCHEMA_VERSION.to_string(),
            ok: true,
            diagnostics: Vec::new(),
            meta: BTreeMap::new(),
        }
    }

    pub fn with_diagnostics(mut self, mut diagnostics: Vec<Diagnostic>) -> Self {
        diagnostics.sort_by(|a, b| {
            let ao = a.start_offset().unwrap_or(u64::MAX);
            let bo = b.start_offset().unwrap_or(u64::MAX);
            ao.cmp(&bo)
                .then_with(|| a.code.cmp(&b.code))
                .then_with(|| a.message.cmp(&b.message))
        });
        self.ok = diagnostics.iter().all(|d| d.severity != Severity::Error);
        self.diagnostics = diagnostics;
        self
    }

    pub fn with_meta(mut self, key: &str, value: Value) -> Self {
        self.meta.insert(key.to_string(), value);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(code: &str, offset: Option<u64>) -> Diagnostic {
        Diagnostic {
            code: code.to_string(),
            severity: Severity::Error,
            stage: Stage::Check,
            message: String::new(),
            loc: offset.map(|o| Location::Text {
                span: Span {
                    start: Position {
                        line: 1,
                        col: 1,
                        offset: Some(o),
                    },
                    end: Position {
                        line: 1,
                        col: 1,
                        offset: Some(o),
                    },
                    file: None,
                },
                snippet: None,
            }),
            notes: Vec::new(),
            related: Vec::new(),
            data: BTreeMap::new(),
            quickfix: None,
        }
    }

    #[test]
    fn report_orders_by_offset_then_code() {
        let report = Report::ok().with_diagnostics(vec![
            at("B", Some(9)),
            at("Z", None),
            at("B", Some(2)),
            at("A", Some(9)),
        ]);
        let order: Vec<_> = report
            .diagnostics
            .iter()
            .map(|d| (d.code.as_str(), d.start_offset()))
            .collect();
        assert_eq!(
            order,
            vec![("B", Some(2)), ("A", Some(9)), ("B", Some(9)), ("Z", None)]
        );
        assert!(!report.ok);
    }

    #[test]
    fn empty_report_is_ok() {
        let report = Report::ok().with_diagnostics(Vec::new());
        assert!(report.ok);
        let json = serde_json::to_value(&report).expect("serialize report");
        assert_eq!(json["schema_version"], IRFORGE_DIAG_SCHEMA_VERSION);
        assert!(json.get("meta").is_none());
    }
}
