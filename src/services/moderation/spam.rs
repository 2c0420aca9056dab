use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::bot::error::Error;
use crate::constants::moderation::{SPAM_LINK_FLOOD_COUNT, SPAM_MENTION_FLOOD_COUNT};
use crate::events::ContentEvent;
use crate::services::moderation::verdict::{SkipReason, SpamClassification};
use crate::services::trust::TrustSource;

/// What the classifier sees; deliberately smaller than the full event
#[derive(Debug, Clone)]
pub struct SpamCheckRequest {
    pub chat_id: u64,
    pub user_id: u64,
    pub text: String,
    pub mention_count: usize,
    pub attachment_count: usize,
}

impl SpamCheckRequest {
    pub fn from_event(event: &ContentEvent) -> Self {
        Self {
            chat_id: event.chat_id,
            user_id: event.user_id,
            text: event.text.clone(),
            mention_count: event.mention_count,
            attachment_count: event.attachments.len(),
        }
    }
}

/// Opaque spam scorer. Model internals are somebody else's problem; the
/// coordinator only relies on the boolean and the confidence.
#[async_trait]
pub trait SpamClassifier: Send + Sync {
    async fn classify(&self, request: &SpamCheckRequest) -> Result<SpamClassification, Error>;
}

/// Outcome of the trust-gated spam check for one event
#[derive(Debug, Clone, PartialEq)]
pub struct SpamCheckOutcome {
    pub is_user_trusted: bool,
    pub is_user_admin: bool,
    pub spam_check_skipped: bool,
    pub skip_reason: Option<SkipReason>,
    pub spam_result: Option<SpamClassification>,
}

impl SpamCheckOutcome {
    pub fn is_spam(&self) -> bool {
        !self.spam_check_skipped
            && self.spam_result.map(|r| r.is_spam).unwrap_or(false)
    }

    pub fn should_allow(&self) -> bool {
        self.spam_check_skipped || !self.is_spam()
    }

    fn skipped(is_user_trusted: bool, is_user_admin: bool, reason: SkipReason) -> Self {
        Self {
            is_user_trusted,
            is_user_admin,
            spam_check_skipped: true,
            skip_reason: Some(reason),
            spam_result: None,
        }
    }
}

/// Merges the trust/admin bypass gate with the opaque classifier
pub struct SpamCoordinator {
    trust: Arc<dyn TrustSource>,
    classifier: Arc<dyn SpamClassifier>,
}

impl SpamCoordinator {
    pub fn new(trust: Arc<dyn TrustSource>, classifier: Arc<dyn SpamClassifier>) -> Self {
        Self { trust, classifier }
    }

    pub async fn check(&self, request: &SpamCheckRequest) -> Result<SpamCheckOutcome, Error> {
        // Trust and admin are independent lookups; either alone bypasses
        // classification. A user can be trusted without being an admin and
        // the other way around.
        let is_user_trusted = self
            .trust
            .is_trusted(request.user_id, request.chat_id)
            .await?;
        let is_user_admin = self.trust.is_admin(request.user_id, request.chat_id).await?;

        if is_user_trusted {
            debug!(
                "Skipping spam check for trusted user {} in chat {}",
                request.user_id, request.chat_id
            );
            return Ok(SpamCheckOutcome::skipped(
                is_user_trusted,
                is_user_admin,
                SkipReason::Trusted,
            ));
        }

        if is_user_admin {
            debug!(
                "Skipping spam check for admin {} in chat {}",
                request.user_id, request.chat_id
            );
            return Ok(SpamCheckOutcome::skipped(
                is_user_trusted,
                is_user_admin,
                SkipReason::Admin,
            ));
        }

        match self.classifier.classify(request).await {
            Ok(result) => Ok(SpamCheckOutcome {
                is_user_trusted,
                is_user_admin,
                spam_check_skipped: false,
                skip_reason: None,
                spam_result: Some(result),
            }),
            Err(e) => {
                // Classifier outages degrade protection, they never block
                // legitimate message flow
                warn!(
                    "Spam classifier failed for user {} in chat {}: {} (failing open)",
                    request.user_id, request.chat_id, e
                );
                Ok(SpamCheckOutcome::skipped(
                    is_user_trusted,
                    is_user_admin,
                    SkipReason::ClassifierError,
                ))
            }
        }
    }
}

/// Built-in heuristic scorer used when no external classifier is wired in.
/// Scores a handful of flood and bait signals and flags the message once the
/// combined score crosses the configured threshold.
pub struct HeuristicSpamClassifier {
    score_threshold: u32,
}

impl HeuristicSpamClassifier {
    pub fn new(score_threshold: u32) -> Self {
        Self { score_threshold }
    }

    fn score(&self, request: &SpamCheckRequest) -> u32 {
        let text = request.text.as_str();
        let mut score = 0u32;

        let link_count = text.matches("http://").count() + text.matches("https://").count();
        if link_count >= SPAM_LINK_FLOOD_COUNT {
            score += 40;
        } else if link_count > 0 && request.attachment_count > 0 {
            score += 15;
        }

        if request.mention_count >= SPAM_MENTION_FLOOD_COUNT {
            score += 40;
        }

        if text.contains("discord.gg/") && link_count > 0 {
            score += 30;
        }

        let letters: Vec<char> = text.chars().filter(|c| c.is_alphabetic()).collect();
        if letters.len() > 12 {
            let upper = letters.iter().filter(|c| c.is_uppercase()).count();
            if upper * 10 >= letters.len() * 8 {
                score += 20;
            }
        }

        if has_long_char_run(text, 8) {
            score += 15;
        }

        score.min(100)
    }
}

fn has_long_char_run(text: &str, limit: usize) -> bool {
    let mut last = None;
    let mut run = 0usize;
    for c in text.chars() {
        if Some(c) == last {
            run += 1;
            if run >= limit {
                return true;
            }
        } else {
            last = Some(c);
            run = 1;
        }
    }
    false
}

#[async_trait]
impl SpamClassifier for HeuristicSpamClassifier {
    async fn classify(&self, request: &SpamCheckRequest) -> Result<SpamClassification, Error> {
        let score = self.score(request);
        Ok(SpamClassification {
            is_spam: score >= self.score_threshold,
            confidence: score as f32 / 100.0,
        })
    }
}
