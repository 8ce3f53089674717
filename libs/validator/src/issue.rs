//! Validation issues and the report they roll up into

use arbiter_dsl::SourceLocation;
use serde::Serialize;

/// Issue severity, ordered from most to least severe
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Critical,
    Error,
    Warning,
    Info,
}

/// One finding from a validation pass
#[derive(Debug, Clone, Serialize)]
pub struct Issue {
    pub code: String,
    pub severity: Severity,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<SourceLocation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub examples: Vec<String>,
}

impl Issue {
    pub fn new(code: impl Into<String>, severity: Severity, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            severity,
            message: message.into(),
            location: None,
            suggestion: None,
            examples: Vec::new(),
        }
    }

    pub fn at(mut self, location: SourceLocation) -> Self {
        self.location = Some(location);
        self
    }

    pub fn suggest(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    pub fn example(mut self, example: impl Into<String>) -> Self {
        self.examples.push(example.into());
        self
    }
}

/// Overall validation status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ValidationStatus {
    CriticalError,
    Error,
    Warning,
    Valid,
}

/// The full validation report
#[derive(Debug, Clone, Serialize)]
pub struct ValidationReport {
    pub status: ValidationStatus,
    #[serde(rename = "qualityScore")]
    pub quality_score: u32,
    pub issues: Vec<Issue>,
}

impl ValidationReport {
    /// Roll issues up into a status and quality score.
    ///
    /// Score = max(0, 100 - 25*critical - 10*error - 5*warning - 1*info).
    pub fn from_issues(mut issues: Vec<Issue>) -> Self {
        issues.sort_by_key(|issue| issue.severity);

        let count = |severity: Severity| -> u32 {
            issues.iter().filter(|i| i.severity == severity).count() as u32
        };
        let critical = count(Severity::Critical);
        let errors = count(Severity::Error);
        let warnings = count(Severity::Warning);
        let infos = count(Severity::Info);

        let penalty = 25 * critical + 10 * errors + 5 * warnings + infos;
        let quality_score = 100u32.saturating_sub(penalty);

        let status = if critical > 0 {
            ValidationStatus::CriticalError
        } else if errors > 0 {
            ValidationStatus::Error
        } else if warnings > 0 {
            ValidationStatus::Warning
        } else {
            ValidationStatus::Valid
        };

        Self {
            status,
            quality_score,
            issues,
        }
    }

    pub fn is_valid(&self) -> bool {
        matches!(
            self.status,
            ValidationStatus::Valid | ValidationStatus::Warning
        )
    }
}
