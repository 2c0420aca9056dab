use serde::Serialize;

/// Why the spam branch was skipped for an event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SkipReason {
    Trusted,
    Admin,
    /// Classifier outage; the check fails open rather than blocking messages
    #[serde(rename = "error")]
    ClassifierError,
}

impl SkipReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            SkipReason::Trusted => "trusted",
            SkipReason::Admin => "admin",
            SkipReason::ClassifierError => "error",
        }
    }
}

/// Raw output of the opaque spam classifier, passed through unchanged
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SpamClassification {
    pub is_spam: bool,
    pub confidence: f32,
}

/// The authoritative per-event moderation verdict.
///
/// Built once per content event and never mutated afterwards; the action
/// executor consumes it and the only persistent trace is an audit row.
/// Critical violations are collected for every sender — trust and admin
/// status suppress only the spam branch, never the critical branch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModerationVerdict {
    pub is_user_trusted: bool,
    pub is_user_admin: bool,
    pub spam_check_skipped: bool,
    pub skip_reason: Option<SkipReason>,
    pub critical_violations: Vec<String>,
    pub spam_result: Option<SpamClassification>,
}

impl ModerationVerdict {
    pub fn has_critical_violations(&self) -> bool {
        !self.critical_violations.is_empty()
    }

    pub fn is_spam(&self) -> bool {
        !self.spam_check_skipped
            && self.spam_result.map(|r| r.is_spam).unwrap_or(false)
    }

    pub fn should_allow(&self) -> bool {
        self.critical_violations.is_empty() && (self.spam_check_skipped || !self.is_spam())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clean_verdict() -> ModerationVerdict {
        ModerationVerdict {
            is_user_trusted: false,
            is_user_admin: false,
            spam_check_skipped: false,
            skip_reason: None,
            critical_violations: vec![],
            spam_result: Some(SpamClassification {
                is_spam: false,
                confidence: 0.1,
            }),
        }
    }

    #[test]
    fn clean_message_is_allowed() {
        let verdict = clean_verdict();
        assert!(verdict.should_allow());
        assert!(!verdict.is_spam());
        assert!(!verdict.has_critical_violations());
    }

    #[test]
    fn critical_violations_override_everything() {
        let verdict = ModerationVerdict {
            is_user_trusted: true,
            is_user_admin: true,
            spam_check_skipped: true,
            skip_reason: Some(SkipReason::Trusted),
            critical_violations: vec!["link to blocked domain 'evil.example'".to_string()],
            spam_result: None,
        };

        assert!(verdict.has_critical_violations());
        assert!(!verdict.should_allow());
    }

    #[test]
    fn skipped_check_is_never_spam() {
        let verdict = ModerationVerdict {
            spam_check_skipped: true,
            skip_reason: Some(SkipReason::Admin),
            // A stale classification must not count once the check is skipped
            spam_result: Some(SpamClassification {
                is_spam: true,
                confidence: 0.99,
            }),
            ..clean_verdict()
        };

        assert!(!verdict.is_spam());
        assert!(verdict.should_allow());
    }

    #[test]
    fn spam_verdict_blocks_message() {
        let verdict = ModerationVerdict {
            spam_result: Some(SpamClassification {
                is_spam: true,
                confidence: 0.87,
            }),
            ..clean_verdict()
        };

        assert!(verdict.is_spam());
        assert!(!verdict.should_allow());
    }

    #[test]
    fn skip_reason_strings() {
        assert_eq!(SkipReason::Trusted.as_str(), "trusted");
        assert_eq!(SkipReason::Admin.as_str(), "admin");
        assert_eq!(SkipReason::ClassifierError.as_str(), "error");
    }
}
