use tracing::info;

use crate::bot::error::Error;
use crate::events::ContentEvent;
use crate::services::moderation::critical::CriticalScanRegistry;
use crate::services::moderation::spam::{SpamCheckRequest, SpamCoordinator};
use crate::services::moderation::verdict::ModerationVerdict;

/// Merges critical screening and the trust-gated spam check into one
/// authoritative verdict per content event.
///
/// Pure read-and-decide: the coordinator never touches chat state. Given the
/// same event and unchanged collaborator answers, it produces an identical
/// verdict every time.
pub struct DecisionCoordinator {
    registry: CriticalScanRegistry,
    spam: SpamCoordinator,
}

impl DecisionCoordinator {
    pub fn new(registry: CriticalScanRegistry, spam: SpamCoordinator) -> Self {
        Self { registry, spam }
    }

    pub async fn evaluate(&self, event: &ContentEvent) -> Result<ModerationVerdict, Error> {
        // Critical checks run for everyone, before and regardless of the
        // trust gate; trust only ever suppresses the spam branch. A scanner
        // failure propagates and blocks the event.
        let critical_violations = self.registry.scan_all(event).await?;

        let outcome = self
            .spam
            .check(&SpamCheckRequest::from_event(event))
            .await?;

        let verdict = ModerationVerdict {
            is_user_trusted: outcome.is_user_trusted,
            is_user_admin: outcome.is_user_admin,
            spam_check_skipped: outcome.spam_check_skipped,
            skip_reason: outcome.skip_reason,
            critical_violations,
            spam_result: outcome.spam_result,
        };

        if !verdict.should_allow() {
            info!(
                "Message {} from user {} in chat {} blocked (critical: {}, spam: {})",
                event.message_id,
                event.user_id,
                event.chat_id,
                verdict.critical_violations.len(),
                verdict.is_spam()
            );
        }

        Ok(verdict)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;

    use super::*;
    use crate::services::moderation::critical::CriticalScanner;
    use crate::services::moderation::spam::{SpamClassifier, SpamCheckRequest};
    use crate::services::moderation::verdict::{SkipReason, SpamClassification};
    use crate::services::trust::TrustSource;

    struct StaticTrust {
        trusted: bool,
        admin: bool,
    }

    #[async_trait]
    impl TrustSource for StaticTrust {
        async fn is_trusted(&self, _user_id: u64, _chat_id: u64) -> Result<bool, Error> {
            Ok(self.trusted)
        }

        async fn is_admin(&self, _user_id: u64, _chat_id: u64) -> Result<bool, Error> {
            Ok(self.admin)
        }
    }

    struct StaticClassifier {
        result: Option<SpamClassification>,
    }

    #[async_trait]
    impl SpamClassifier for StaticClassifier {
        async fn classify(&self, _request: &SpamCheckRequest) -> Result<SpamClassification, Error> {
            self.result.ok_or_else(|| Error::custom("classifier down"))
        }
    }

    struct FixedScanner {
        name: &'static str,
        violations: Vec<String>,
    }

    #[async_trait]
    impl CriticalScanner for FixedScanner {
        fn name(&self) -> &'static str {
            self.name
        }

        async fn scan(&self, _event: &ContentEvent) -> Result<Vec<String>, Error> {
            Ok(self.violations.clone())
        }
    }

    struct FailingScanner;

    #[async_trait]
    impl CriticalScanner for FailingScanner {
        fn name(&self) -> &'static str {
            "failing"
        }

        async fn scan(&self, _event: &ContentEvent) -> Result<Vec<String>, Error> {
            Err(Error::custom("backend down"))
        }
    }

    fn event() -> ContentEvent {
        ContentEvent {
            chat_id: 100,
            channel_id: 200,
            message_id: 300,
            user_id: 400,
            user_display_name: "poster".to_string(),
            user_avatar_url: None,
            text: "hello world".to_string(),
            mention_count: 0,
            attachments: vec![],
            is_edit: false,
        }
    }

    fn coordinator(
        scanners: Vec<Box<dyn CriticalScanner>>,
        trusted: bool,
        admin: bool,
        classification: Option<SpamClassification>,
    ) -> DecisionCoordinator {
        DecisionCoordinator::new(
            CriticalScanRegistry::new(scanners),
            SpamCoordinator::new(
                Arc::new(StaticTrust { trusted, admin }),
                Arc::new(StaticClassifier {
                    result: classification,
                }),
            ),
        )
    }

    #[tokio::test]
    async fn critical_violations_block_even_trusted_admins() {
        let coordinator = coordinator(
            vec![Box::new(FixedScanner {
                name: "url_filter",
                violations: vec!["link to blocked domain 'evil.example'".to_string()],
            })],
            true,
            true,
            None,
        );

        let verdict = coordinator.evaluate(&event()).await.unwrap();

        assert!(verdict.has_critical_violations());
        assert!(!verdict.should_allow());
        // The spam branch was still bypassed; trust suppresses spam only
        assert!(verdict.spam_check_skipped);
        assert_eq!(verdict.skip_reason, Some(SkipReason::Trusted));
    }

    #[tokio::test]
    async fn violations_accumulate_across_scanners() {
        let coordinator = coordinator(
            vec![
                Box::new(FixedScanner {
                    name: "url_filter",
                    violations: vec!["first".to_string()],
                }),
                Box::new(FixedScanner {
                    name: "file_type",
                    violations: vec!["second".to_string(), "third".to_string()],
                }),
            ],
            false,
            false,
            Some(SpamClassification {
                is_spam: false,
                confidence: 0.0,
            }),
        );

        let verdict = coordinator.evaluate(&event()).await.unwrap();

        assert_eq!(
            verdict.critical_violations,
            vec!["first".to_string(), "second".to_string(), "third".to_string()]
        );
    }

    #[tokio::test]
    async fn trusted_clean_message_is_allowed_with_reason() {
        let coordinator = coordinator(vec![], true, false, None);
        let verdict = coordinator.evaluate(&event()).await.unwrap();

        assert!(verdict.should_allow());
        assert!(verdict.spam_check_skipped);
        assert_eq!(verdict.skip_reason, Some(SkipReason::Trusted));
    }

    #[tokio::test]
    async fn untrusted_spam_verdict_passes_through() {
        let coordinator = coordinator(
            vec![],
            false,
            false,
            Some(SpamClassification {
                is_spam: true,
                confidence: 0.91,
            }),
        );
        let verdict = coordinator.evaluate(&event()).await.unwrap();

        assert!(verdict.is_spam());
        assert!(!verdict.should_allow());
        assert_eq!(
            verdict.spam_result,
            Some(SpamClassification {
                is_spam: true,
                confidence: 0.91,
            })
        );
    }

    #[tokio::test]
    async fn classifier_outage_degrades_to_skip() {
        let coordinator = coordinator(vec![], false, false, None);
        let verdict = coordinator.evaluate(&event()).await.unwrap();

        assert!(verdict.should_allow());
        assert!(verdict.spam_check_skipped);
        assert_eq!(verdict.skip_reason, Some(SkipReason::ClassifierError));
    }

    #[tokio::test]
    async fn scanner_failure_is_fatal_for_the_event() {
        let coordinator = coordinator(vec![Box::new(FailingScanner)], false, false, None);
        assert!(coordinator.evaluate(&event()).await.is_err());
    }

    #[tokio::test]
    async fn evaluation_is_deterministic_for_unchanged_inputs() {
        let coordinator = coordinator(
            vec![Box::new(FixedScanner {
                name: "url_filter",
                violations: vec!["link to blocked domain 'evil.example'".to_string()],
            })],
            false,
            false,
            Some(SpamClassification {
                is_spam: true,
                confidence: 0.75,
            }),
        );

        let event = event();
        let first = coordinator.evaluate(&event).await.unwrap();
        let second = coordinator.evaluate(&event).await.unwrap();

        assert_eq!(first, second);
    }
}
