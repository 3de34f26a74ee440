//! Project-level security scoring over the scanner findings.

pub mod owasp;

use crate::core::{Finding, FindingCategory, Severity};
use serde::Serialize;
use std::collections::BTreeMap;

pub use owasp::{assess, AccessControlFacts, CategoryScore, OwaspAssessment, OwaspCategory};

/// Points a single security finding removes from the 100-point score.
pub fn severity_weight(severity: Severity) -> u32 {
    match severity {
        Severity::Critical => 20,
        Severity::High => 10,
        Severity::Medium => 5,
        Severity::Low => 1,
    }
}

/// 100 minus the weighted security findings, clamped to 0..=100.
pub fn security_score(findings: &[Finding]) -> u32 {
    let deducted: u64 = security_findings(findings)
        .map(|f| u64::from(severity_weight(f.severity)))
        .sum();
    100u64.saturating_sub(deducted) as u32
}

fn security_findings(findings: &[Finding]) -> impl Iterator<Item = &Finding> {
    findings
        .iter()
        .filter(|f| f.kind.category() == FindingCategory::Security)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SecuritySummary {
    pub score: u32,
    pub by_severity: BTreeMap<Severity, usize>,
    pub owasp: OwaspAssessment,
}

pub fn summarize(findings: &[Finding], access: AccessControlFacts<'_>) -> SecuritySummary {
    let mut by_severity = BTreeMap::new();
    for finding in security_findings(findings) {
        *by_severity.entry(finding.severity).or_insert(0) += 1;
    }
    SecuritySummary {
        score: security_score(findings),
        by_severity,
        owasp: assess(findings, access),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::FindingKind;

    fn finding(kind: FindingKind, severity: Severity) -> Finding {
        Finding::new(kind, severity, "a.js", 1, "", "")
    }

    #[test]
    fn test_security_score_weights() {
        let findings = vec![
            finding(FindingKind::HardcodedSecret, Severity::Critical),
            finding(FindingKind::CodeInjection, Severity::High),
            finding(FindingKind::Xss, Severity::Medium),
            finding(FindingKind::UnvalidatedEnvRead, Severity::Low),
            // Performance findings do not count
            finding(FindingKind::DomQueryInLoop, Severity::High),
        ];
        assert_eq!(security_score(&findings), 100 - 20 - 10 - 5 - 1);
    }

    #[test]
    fn test_security_score_clamps() {
        let findings: Vec<_> = (0..6)
            .map(|_| finding(FindingKind::SqlInjection, Severity::Critical))
            .collect();
        assert_eq!(security_score(&findings), 0);
        assert_eq!(security_score(&[]), 100);
    }

    #[test]
    fn test_summary_counts_by_severity() {
        let findings = vec![
            finding(FindingKind::HardcodedSecret, Severity::Critical),
            finding(FindingKind::HardcodedSecret, Severity::Critical),
            finding(FindingKind::DeepClone, Severity::Medium),
        ];
        let summary = summarize(&findings, AccessControlFacts { routes: &[], has_authorization: false });
        assert_eq!(summary.by_severity.get(&Severity::Critical), Some(&2));
        assert_eq!(summary.by_severity.get(&Severity::Medium), None);
        assert_eq!(summary.score, 60);
    }
}
