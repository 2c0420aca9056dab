use crate::services::impersonation::detector::ImpersonationVerdict;

/// Render a user id as a platform mention
pub fn mention(user_id: u64) -> String {
    format!("<@{}>", user_id)
}

/// Notice sent to a user whose message broke an always-enforced rule
pub fn critical_notice(violations: &[String]) -> String {
    let mut text = String::from("Your message was removed because it broke the server rules:\n");
    for violation in violations {
        text.push_str("- ");
        text.push_str(violation);
        text.push('\n');
    }
    text.push_str("Repeated violations can lead to a ban.");
    text
}

/// Notice sent to a user whose message was classified as spam
pub fn spam_notice() -> String {
    "Your message was removed because it was flagged as spam. \
    If you believe this was a mistake, contact a moderator."
        .to_string()
}

/// Admin-facing alert for a review-band impersonation verdict
pub fn impersonation_alert(verdict: &ImpersonationVerdict) -> String {
    let mut text = format!(
        "Possible admin impersonation: {} closely resembles {} (score {}).",
        mention(verdict.suspected_user_id),
        mention(verdict.target_user_id),
        verdict.total_score
    );

    if verdict.name_match {
        text.push_str(" Display name matches.");
    }
    if let Some(similarity) = verdict.photo_similarity {
        text.push_str(&format!(" Avatar similarity {:.0}%.", similarity * 100.0));
    }
    text.push_str("\nUse the buttons below to ban or dismiss.");
    text
}

/// In-channel announcement after an automatic impersonation ban
pub fn impersonation_ban_notice(verdict: &ImpersonationVerdict) -> String {
    format!(
        "{} was banned automatically for impersonating {} (score {}).",
        mention(verdict.suspected_user_id),
        mention(verdict.target_user_id),
        verdict.total_score
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::impersonation::detector::RiskLevel;

    #[test]
    fn critical_notice_lists_every_violation() {
        let notice = critical_notice(&[
            "link to blocked domain 'evil.example'".to_string(),
            "blocked phrase 'free nitro'".to_string(),
        ]);

        assert!(notice.contains("evil.example"));
        assert!(notice.contains("free nitro"));
    }

    #[test]
    fn alert_mentions_both_parties() {
        let verdict = ImpersonationVerdict {
            total_score: 50,
            risk_level: RiskLevel::High,
            suspected_user_id: 99,
            target_user_id: 1,
            chat_id: 10,
            name_match: true,
            photo_match: false,
            photo_similarity: None,
        };

        let alert = impersonation_alert(&verdict);
        assert!(alert.contains("<@99>"));
        assert!(alert.contains("<@1>"));
        assert!(alert.contains("score 50"));
    }
}
