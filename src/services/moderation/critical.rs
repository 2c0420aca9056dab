use async_trait::async_trait;
use once_cell::sync::Lazy;
use tracing::debug;

use crate::bot::error::Error;
use crate::config::Settings;
use crate::events::ContentEvent;

/// One always-on content check. Scanners run for every sender; no amount of
/// trust or admin status turns them off.
#[async_trait]
pub trait CriticalScanner: Send + Sync {
    fn name(&self) -> &'static str;

    /// Empty result means clean; each entry describes one violation
    async fn scan(&self, event: &ContentEvent) -> Result<Vec<String>, Error>;
}

/// Runs the full registered scanner set and concatenates their findings.
/// Scanners are independent: a hit in one never short-circuits the rest, so
/// the verdict carries every violation at once.
pub struct CriticalScanRegistry {
    scanners: Vec<Box<dyn CriticalScanner>>,
}

impl CriticalScanRegistry {
    pub fn new(scanners: Vec<Box<dyn CriticalScanner>>) -> Self {
        Self { scanners }
    }

    /// The production set: URL filtering, file-type screening, bait phrases
    pub fn standard(settings: &Settings) -> Self {
        Self::new(vec![
            Box::new(UrlFilterScanner::new(settings.blocked_domains.clone())),
            Box::new(FileTypeScanner::new(settings.blocked_file_extensions.clone())),
            Box::new(BaitPhraseScanner),
        ])
    }

    pub async fn scan_all(&self, event: &ContentEvent) -> Result<Vec<String>, Error> {
        let mut violations = Vec::new();

        for scanner in &self.scanners {
            // A scanner failure must block the event, not silently pass it:
            // these checks exist for the highest-severity content
            let mut found = scanner
                .scan(event)
                .await
                .map_err(|e| Error::CriticalScan {
                    scanner: scanner.name(),
                    message: e.to_string(),
                })?;

            if !found.is_empty() {
                debug!(
                    "Scanner '{}' found {} violation(s) in message {}",
                    scanner.name(),
                    found.len(),
                    event.message_id
                );
            }
            violations.append(&mut found);
        }

        Ok(violations)
    }
}

/// Top-level domains that are overwhelmingly abused in chat spam
static SUSPICIOUS_TLDS: Lazy<Vec<&'static str>> = Lazy::new(|| {
    vec![
        "tk", "ml", "ga", "cf", "gq", "top", "click", "loan", "download", "racing", "stream",
    ]
});

/// Flags links to explicitly blocked domains and suspicious TLDs
pub struct UrlFilterScanner {
    blocked_domains: Vec<String>,
}

impl UrlFilterScanner {
    pub fn new(blocked_domains: Vec<String>) -> Self {
        Self { blocked_domains }
    }

    fn check_domain(&self, domain: &str) -> Option<String> {
        let domain = domain.trim_start_matches("www.");

        for blocked in &self.blocked_domains {
            if domain == blocked || domain.ends_with(&format!(".{}", blocked)) {
                return Some(format!("link to blocked domain '{}'", domain));
            }
        }

        if let Some(tld) = domain.rsplit('.').next() {
            if SUSPICIOUS_TLDS.contains(&tld) {
                return Some(format!("link with suspicious top-level domain '{}'", domain));
            }
        }

        None
    }
}

#[async_trait]
impl CriticalScanner for UrlFilterScanner {
    fn name(&self) -> &'static str {
        "url_filter"
    }

    async fn scan(&self, event: &ContentEvent) -> Result<Vec<String>, Error> {
        let mut violations = Vec::new();

        for domain in extract_domains(&event.text) {
            if let Some(violation) = self.check_domain(&domain) {
                violations.push(violation);
            }
        }

        Ok(violations)
    }
}

/// Pulls the host portion out of every http(s) link in the text
fn extract_domains(text: &str) -> Vec<String> {
    let mut domains = Vec::new();

    for token in text.split_whitespace() {
        let rest = token
            .strip_prefix("https://")
            .or_else(|| token.strip_prefix("http://"));

        if let Some(rest) = rest {
            let host = rest
                .split(['/', '?', '#'])
                .next()
                .unwrap_or("")
                .split(':')
                .next()
                .unwrap_or("")
                .trim_matches(|c: char| !c.is_alphanumeric() && c != '.' && c != '-')
                .to_lowercase();

            if !host.is_empty() {
                domains.push(host);
            }
        }
    }

    domains
}

/// File extensions that are never acceptable as chat uploads
static DEFAULT_BLOCKED_EXTENSIONS: Lazy<Vec<&'static str>> = Lazy::new(|| {
    vec![
        "exe", "scr", "bat", "cmd", "com", "pif", "msi", "jar", "vbs", "apk",
    ]
});

/// Flags attachments whose extension is on the block list
pub struct FileTypeScanner {
    blocked_extensions: Vec<String>,
}

impl FileTypeScanner {
    pub fn new(extra_extensions: Vec<String>) -> Self {
        let mut blocked_extensions: Vec<String> = DEFAULT_BLOCKED_EXTENSIONS
            .iter()
            .map(|s| s.to_string())
            .collect();
        blocked_extensions.extend(extra_extensions);
        Self { blocked_extensions }
    }
}

#[async_trait]
impl CriticalScanner for FileTypeScanner {
    fn name(&self) -> &'static str {
        "file_type"
    }

    async fn scan(&self, event: &ContentEvent) -> Result<Vec<String>, Error> {
        let mut violations = Vec::new();

        for attachment in &event.attachments {
            let extension = attachment
                .filename
                .rsplit('.')
                .next()
                .unwrap_or("")
                .to_lowercase();

            if self.blocked_extensions.iter().any(|e| *e == extension) {
                violations.push(format!(
                    "attachment '{}' has a blocked file type '.{}'",
                    attachment.filename, extension
                ));
            }
        }

        Ok(violations)
    }
}

/// Phrases that are reliable markers of account-theft bait
static BAIT_PHRASES: Lazy<Vec<&'static str>> = Lazy::new(|| {
    vec![
        "free nitro",
        "free robux",
        "steam gift for you",
        "claim your airdrop",
        "crypto giveaway",
    ]
});

/// Flags known scam bait regardless of who posts it
pub struct BaitPhraseScanner;

#[async_trait]
impl CriticalScanner for BaitPhraseScanner {
    fn name(&self) -> &'static str {
        "bait_phrase"
    }

    async fn scan(&self, event: &ContentEvent) -> Result<Vec<String>, Error> {
        let text = event.text.to_lowercase();
        let violations = BAIT_PHRASES
            .iter()
            .filter(|phrase| text.contains(*phrase))
            .map(|phrase| format!("blocked phrase '{}'", phrase))
            .collect();

        Ok(violations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::Attachment;

    fn event(text: &str, attachments: Vec<Attachment>) -> ContentEvent {
        ContentEvent {
            chat_id: 1,
            channel_id: 2,
            message_id: 3,
            user_id: 4,
            user_display_name: "poster".to_string(),
            user_avatar_url: None,
            text: text.to_string(),
            mention_count: 0,
            attachments,
            is_edit: false,
        }
    }

    #[tokio::test]
    async fn url_scanner_flags_blocked_domains_and_subdomains() {
        let scanner = UrlFilterScanner::new(vec!["evil.example".to_string()]);

        let found = scanner
            .scan(&event("see https://cdn.evil.example/payload now", vec![]))
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert!(found[0].contains("cdn.evil.example"));

        let clean = scanner
            .scan(&event("see https://example.com/docs", vec![]))
            .await
            .unwrap();
        assert!(clean.is_empty());
    }

    #[tokio::test]
    async fn url_scanner_flags_suspicious_tlds() {
        let scanner = UrlFilterScanner::new(vec![]);
        let found = scanner
            .scan(&event("download from http://prize-wheel.tk", vec![]))
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
    }

    #[tokio::test]
    async fn file_scanner_flags_executables() {
        let scanner = FileTypeScanner::new(vec![]);
        let found = scanner
            .scan(&event(
                "here you go",
                vec![Attachment {
                    filename: "totally_a_game.EXE".to_string(),
                    url: "https://cdn.example/x".to_string(),
                }],
            ))
            .await
            .unwrap();
        assert_eq!(found.len(), 1);

        let clean = scanner
            .scan(&event(
                "screenshot",
                vec![Attachment {
                    filename: "shot.png".to_string(),
                    url: "https://cdn.example/y".to_string(),
                }],
            ))
            .await
            .unwrap();
        assert!(clean.is_empty());
    }

    #[tokio::test]
    async fn registry_accumulates_across_scanners_in_order() {
        let registry = CriticalScanRegistry::new(vec![
            Box::new(UrlFilterScanner::new(vec!["evil.example".to_string()])),
            Box::new(BaitPhraseScanner),
        ]);

        let found = registry
            .scan_all(&event("free nitro at https://evil.example/claim", vec![]))
            .await
            .unwrap();

        assert_eq!(found.len(), 2);
        // Registration order is preserved: URL findings first, then phrases
        assert!(found[0].contains("blocked domain"));
        assert!(found[1].contains("blocked phrase"));
    }

    struct BrokenScanner;

    #[async_trait]
    impl CriticalScanner for BrokenScanner {
        fn name(&self) -> &'static str {
            "broken"
        }

        async fn scan(&self, _event: &ContentEvent) -> Result<Vec<String>, Error> {
            Err(Error::custom("scanner backend unreachable"))
        }
    }

    #[tokio::test]
    async fn scanner_failure_blocks_the_event() {
        let registry = CriticalScanRegistry::new(vec![Box::new(BrokenScanner)]);
        let result = registry.scan_all(&event("anything", vec![])).await;

        assert!(matches!(
            result,
            Err(Error::CriticalScan { scanner: "broken", .. })
        ));
    }
}
