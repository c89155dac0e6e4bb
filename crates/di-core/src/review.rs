use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
}

impl Severity {
    pub const ALL: [Severity; 4] = [Self::Critical, Self::High, Self::Medium, Self::Low];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Critical => "critical",
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ImprovementType {
    Refactoring,
    Optimization,
    BestPractice,
}

impl ImprovementType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Refactoring => "refactoring",
            Self::Optimization => "optimization",
            Self::BestPractice => "best-practice",
        }
    }
}

/// A single problem the reviewer found in a changed file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewComment {
    pub file: String,
    /// `null` or absent when the model could not pin a line.
    #[serde(default)]
    pub line: Option<u32>,
    pub severity: Severity,
    pub issue: String,
    pub suggestion: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Improvement {
    pub file: String,
    #[serde(default)]
    pub line: Option<u32>,
    #[serde(rename = "type")]
    pub kind: ImprovementType,
    pub suggestion: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewSummary {
    pub total_issues: u32,
    pub critical_issues: u32,
    pub files_reviewed: u32,
}

/// Structured review of a change set against its project context.
///
/// This is both the validated shape of the analysis model's output and the
/// payload stored in the review cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeReview {
    pub overall_quality: String,
    pub summary: ReviewSummary,
    pub potential_bugs: Vec<ReviewComment>,
    pub performance_issues: Vec<ReviewComment>,
    pub security_vulnerabilities: Vec<ReviewComment>,
    pub convention_violations: Vec<ReviewComment>,
    pub improvements: Vec<Improvement>,
    pub positive_points: Vec<String>,
}

impl CodeReview {
    /// All issue comments across the four issue categories.
    pub fn issues(&self) -> impl Iterator<Item = &ReviewComment> {
        self.potential_bugs
            .iter()
            .chain(&self.performance_issues)
            .chain(&self.security_vulnerabilities)
            .chain(&self.convention_violations)
    }

    pub fn stats(&self) -> ReviewStats {
        let mut issues_by_severity: BTreeMap<Severity, usize> =
            Severity::ALL.iter().map(|s| (*s, 0)).collect();
        for issue in self.issues() {
            *issues_by_severity.entry(issue.severity).or_insert(0) += 1;
        }

        ReviewStats {
            total_issues: self.summary.total_issues,
            issues_by_severity,
            issues_by_category: IssuesByCategory {
                bugs: self.potential_bugs.len(),
                performance: self.performance_issues.len(),
                security: self.security_vulnerabilities.len(),
                convention: self.convention_violations.len(),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssuesByCategory {
    pub bugs: usize,
    pub performance: usize,
    pub security: usize,
    pub convention: usize,
}

/// Aggregate counts over a [`CodeReview`], for display next to the review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewStats {
    /// As reported by the model in `summary.totalIssues`.
    pub total_issues: u32,
    pub issues_by_severity: BTreeMap<Severity, usize>,
    pub issues_by_category: IssuesByCategory,
}
