//! OWASP Top 10 style category scoring.
//!
//! Each category starts at 100 and loses a fixed amount per matching rule.
//! A category below [`VIOLATION_THRESHOLD`] counts as a violation; overall
//! compliance is the mean of the category scores.

use crate::core::{Finding, FindingKind, RouteEntry};
use serde::Serialize;
use std::fmt;

pub const VIOLATION_THRESHOLD: u32 = 70;

const UNPROTECTED_ROUTE_PENALTY: u32 = 20;
const NO_AUTHORIZATION_PENALTY: u32 = 30;
const WEAK_HASH_PENALTY: u32 = 40;
const INSECURE_TOKEN_PENALTY: u32 = 25;
const INJECTION_PENALTY: u32 = 30;
const ENV_READ_PENALTY: u32 = 5;
const SECRET_PENALTY: u32 = 25;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum OwaspCategory {
    #[serde(rename = "A01")]
    BrokenAccessControl,
    #[serde(rename = "A02")]
    CryptographicFailures,
    #[serde(rename = "A03")]
    Injection,
    #[serde(rename = "A05")]
    SecurityMisconfiguration,
    #[serde(rename = "A07")]
    AuthenticationFailures,
}

impl OwaspCategory {
    pub const ALL: [OwaspCategory; 5] = [
        Self::BrokenAccessControl,
        Self::CryptographicFailures,
        Self::Injection,
        Self::SecurityMisconfiguration,
        Self::AuthenticationFailures,
    ];

    pub fn code(self) -> &'static str {
        match self {
            Self::BrokenAccessControl => "A01",
            Self::CryptographicFailures => "A02",
            Self::Injection => "A03",
            Self::SecurityMisconfiguration => "A05",
            Self::AuthenticationFailures => "A07",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Self::BrokenAccessControl => "Broken Access Control",
            Self::CryptographicFailures => "Cryptographic Failures",
            Self::Injection => "Injection",
            Self::SecurityMisconfiguration => "Security Misconfiguration",
            Self::AuthenticationFailures => "Identification and Authentication Failures",
        }
    }
}

impl fmt::Display for OwaspCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.code(), self.title())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryScore {
    pub category: OwaspCategory,
    pub title: &'static str,
    pub score: u32,
    /// Number of rule matches that cost points
    pub issues: usize,
    pub violation: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OwaspAssessment {
    pub categories: Vec<CategoryScore>,
    pub compliance: f64,
    pub violations: Vec<OwaspCategory>,
}

/// Inputs that are not findings: the discovered routes and whether any
/// authorization mechanism was seen anywhere in the project.
#[derive(Debug, Clone, Copy)]
pub struct AccessControlFacts<'a> {
    pub routes: &'a [RouteEntry],
    pub has_authorization: bool,
}

pub fn assess(findings: &[Finding], access: AccessControlFacts<'_>) -> OwaspAssessment {
    let count = |pred: fn(FindingKind) -> bool| findings.iter().filter(|f| pred(f.kind)).count();

    let categories: Vec<CategoryScore> = OwaspCategory::ALL
        .iter()
        .map(|&category| {
            let penalties: Vec<(usize, u32)> = match category {
                OwaspCategory::BrokenAccessControl => {
                    let unprotected = access.routes.iter().filter(|r| !r.protected).count();
                    let missing_auth =
                        usize::from(!access.routes.is_empty() && !access.has_authorization);
                    vec![
                        (unprotected, UNPROTECTED_ROUTE_PENALTY),
                        (missing_auth, NO_AUTHORIZATION_PENALTY),
                    ]
                }
                OwaspCategory::CryptographicFailures => vec![
                    (count(|k| k == FindingKind::WeakHash), WEAK_HASH_PENALTY),
                    (count(|k| k == FindingKind::InsecureToken), INSECURE_TOKEN_PENALTY),
                ],
                OwaspCategory::Injection => {
                    vec![(count(FindingKind::is_injection), INJECTION_PENALTY)]
                }
                OwaspCategory::SecurityMisconfiguration => vec![(
                    count(|k| k == FindingKind::UnvalidatedEnvRead),
                    ENV_READ_PENALTY,
                )],
                OwaspCategory::AuthenticationFailures => vec![(
                    count(|k| k == FindingKind::HardcodedSecret),
                    SECRET_PENALTY,
                )],
            };
            score_category(category, &penalties)
        })
        .collect();

    let compliance = categories.iter().map(|c| c.score as f64).sum::<f64>() / categories.len() as f64;
    let violations = categories
        .iter()
        .filter(|c| c.violation)
        .map(|c| c.category)
        .collect();

    OwaspAssessment {
        categories,
        compliance,
        violations,
    }
}

fn score_category(category: OwaspCategory, penalties: &[(usize, u32)]) -> CategoryScore {
    let deducted: u64 = penalties
        .iter()
        .map(|&(n, points)| n as u64 * u64::from(points))
        .sum();
    let score = 100u64.saturating_sub(deducted) as u32;
    CategoryScore {
        category,
        title: category.title(),
        score,
        issues: penalties.iter().map(|&(n, _)| n).sum(),
        violation: score < VIOLATION_THRESHOLD,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{RouteOrigin, Severity};

    fn finding(kind: FindingKind) -> Finding {
        Finding::new(kind, Severity::Medium, "a.js", 1, "", "")
    }

    fn route(protected: bool) -> RouteEntry {
        RouteEntry {
            method: "GET".into(),
            path: "/api/users".into(),
            line: 1,
            origin: RouteOrigin::CallChain,
            middleware: Vec::new(),
            protected,
        }
    }

    fn score_of(assessment: &OwaspAssessment, category: OwaspCategory) -> u32 {
        assessment
            .categories
            .iter()
            .find(|c| c.category == category)
            .map(|c| c.score)
            .unwrap()
    }

    #[test]
    fn test_clean_project_is_fully_compliant() {
        let result = assess(&[], AccessControlFacts { routes: &[], has_authorization: false });
        assert_eq!(result.compliance, 100.0);
        assert!(result.violations.is_empty());
    }

    #[test]
    fn test_access_control_penalties() {
        let routes = [route(false), route(false), route(true)];
        let result = assess(&[], AccessControlFacts { routes: &routes, has_authorization: false });
        assert_eq!(score_of(&result, OwaspCategory::BrokenAccessControl), 100 - 40 - 30);
        assert_eq!(result.violations, vec![OwaspCategory::BrokenAccessControl]);

        let result = assess(&[], AccessControlFacts { routes: &routes, has_authorization: true });
        assert_eq!(score_of(&result, OwaspCategory::BrokenAccessControl), 60);
    }

    #[test]
    fn test_finding_penalties_clamp_at_zero() {
        let findings = vec![
            finding(FindingKind::SqlInjection),
            finding(FindingKind::Xss),
            finding(FindingKind::CodeInjection),
            finding(FindingKind::CodeInjection),
            finding(FindingKind::WeakHash),
            finding(FindingKind::InsecureToken),
            finding(FindingKind::UnvalidatedEnvRead),
            finding(FindingKind::HardcodedSecret),
        ];
        let result = assess(&findings, AccessControlFacts { routes: &[], has_authorization: false });
        assert_eq!(score_of(&result, OwaspCategory::Injection), 0);
        assert_eq!(score_of(&result, OwaspCategory::CryptographicFailures), 35);
        assert_eq!(score_of(&result, OwaspCategory::SecurityMisconfiguration), 95);
        assert_eq!(score_of(&result, OwaspCategory::AuthenticationFailures), 75);
        assert_eq!(result.compliance, (100.0 + 35.0 + 0.0 + 95.0 + 75.0) / 5.0);
        assert_eq!(
            result.violations,
            vec![OwaspCategory::CryptographicFailures, OwaspCategory::Injection]
        );
    }
}
