//! Static advisory tables backing the report's closing recommendations.
//!
//! The rendered recommendations block is a pure function of which severities
//! and message keywords are present in the finding store: a severity advisory
//! fires when its bucket is non-empty, a practice advisory fires when any
//! finding message contains its keyword. Keeping this data-driven keeps the
//! renderer free of per-vulnerability branching.

use crate::core::models::Severity;
use std::collections::BTreeMap;

/// A remediation-urgency line tied to the presence of one severity tier.
pub struct SeverityAdvisory {
    pub severity: Severity,
    pub text: &'static str,
}

/// A hardening-practice line tied to a keyword in finding messages.
/// Keywords are matched case-insensitively.
pub struct PracticeAdvisory {
    pub keyword: &'static str,
    pub text: &'static str,
}

static IMMEDIATE_ACTIONS: &[SeverityAdvisory] = &[
    SeverityAdvisory {
        severity: Severity::Critical,
        text: "Fix all CRITICAL vulnerabilities immediately",
    },
    SeverityAdvisory {
        severity: Severity::High,
        text: "Address HIGH severity issues within 24-48 hours",
    },
    SeverityAdvisory {
        severity: Severity::Medium,
        text: "Plan remediation for MEDIUM severity issues",
    },
];

static BEST_PRACTICES: &[PracticeAdvisory] = &[
    PracticeAdvisory {
        keyword: "injection",
        text: "Use parameterized queries and strict output encoding for all data handling",
    },
    PracticeAdvisory {
        keyword: "validation",
        text: "Implement server-side input validation for every write endpoint",
    },
    PracticeAdvisory {
        keyword: "admin",
        text: "Place authentication and authorization checks in front of all administrative functions",
    },
    PracticeAdvisory {
        keyword: "rate limiting",
        text: "Implement rate limiting on authentication and contact endpoints",
    },
    PracticeAdvisory {
        keyword: "header",
        text: "Set the recommended security headers on every response",
    },
    PracticeAdvisory {
        keyword: "upload",
        text: "Restrict uploads to an allow-list of file types and store them outside the web root",
    },
    PracticeAdvisory {
        keyword: "exposed",
        text: "Remove configuration files and build artifacts from the public web root",
    },
    PracticeAdvisory {
        keyword: "cors",
        text: "Limit cross-origin resource sharing to an explicit origin allow-list",
    },
];

/// Urgency lines for the severities that actually occurred, most severe
/// first.
pub fn immediate_actions(counts: &BTreeMap<Severity, usize>) -> Vec<&'static str> {
    IMMEDIATE_ACTIONS
        .iter()
        .filter(|advisory| counts.get(&advisory.severity).copied().unwrap_or(0) > 0)
        .map(|advisory| advisory.text)
        .collect()
}

/// Practice lines whose keyword appears in at least one finding message,
/// in table order, each at most once.
pub fn best_practices<'a>(messages: impl Iterator<Item = &'a str>) -> Vec<&'static str> {
    let lowered: Vec<String> = messages.map(str::to_lowercase).collect();
    BEST_PRACTICES
        .iter()
        .filter(|advisory| lowered.iter().any(|m| m.contains(advisory.keyword)))
        .map(|advisory| advisory.text)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn critical_presence_triggers_the_immediate_action_line() {
        let mut counts = BTreeMap::new();
        counts.insert(Severity::Critical, 2);
        counts.insert(Severity::Info, 3);
        let actions = immediate_actions(&counts);
        assert_eq!(actions, vec!["Fix all CRITICAL vulnerabilities immediately"]);
    }

    #[test]
    fn no_actions_without_matching_severities() {
        let mut counts = BTreeMap::new();
        counts.insert(Severity::Info, 5);
        assert!(immediate_actions(&counts).is_empty());
    }

    #[test]
    fn practices_match_keywords_case_insensitively_and_once() {
        let messages = [
            "SQL injection error detected: /api/contact",
            "Time-based SQL Injection: /api/search",
            "Missing Content-Security-Policy header",
        ];
        let practices = best_practices(messages.iter().copied());
        assert_eq!(practices.len(), 2);
        assert!(practices[0].contains("parameterized queries"));
        assert!(practices[1].contains("security headers"));
    }
}
