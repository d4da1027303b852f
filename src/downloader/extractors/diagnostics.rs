// Classifies yt-dlp stderr so failures are readable in the server log.
// Nothing here reaches the HTTP response.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureCause {
    Drm,
    MembersOnly,
    AgeGate,
    Private,
    Removed,
    GeoBlocked,
    RateLimited,
    BotCheck,
    Forbidden,
    Network,
    Other,
}

/// Checked top to bottom; the first cause with a matching needle wins.
const RULES: &[(FailureCause, &[&str])] = &[
    (
        FailureCause::Drm,
        &["drm", "widevine", "youtube premium", "requires purchase", "rental"],
    ),
    (
        FailureCause::MembersOnly,
        &["members only", "members-only", "join this channel", "available to members"],
    ),
    (
        FailureCause::AgeGate,
        &["age-restricted", "confirm your age", "age_verification"],
    ),
    (
        FailureCause::Private,
        &["private video", "video is private", "been granted access"],
    ),
    (
        FailureCause::Removed,
        &["video unavailable", "has been removed", "no longer available", "video is unavailable"],
    ),
    (
        FailureCause::GeoBlocked,
        &["available in your country", "blocked in your country", "geo restriction"],
    ),
    (
        FailureCause::RateLimited,
        &["429", "rate limit", "too many requests"],
    ),
    (
        FailureCause::BotCheck,
        &["not a bot", "captcha", "unusual traffic"],
    ),
    (FailureCause::Forbidden, &["403", "forbidden"]),
    (
        FailureCause::Network,
        &["timeout", "timed out", "connection refused", "network unreachable", "name resolution"],
    ),
];

impl FailureCause {
    /// Whether the same request could succeed later (throttling, network).
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::RateLimited | Self::BotCheck | Self::Forbidden | Self::Network
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Drm => "drm-protected",
            Self::MembersOnly => "members-only",
            Self::AgeGate => "age-restricted",
            Self::Private => "private",
            Self::Removed => "unavailable",
            Self::GeoBlocked => "geo-blocked",
            Self::RateLimited => "rate-limited",
            Self::BotCheck => "bot-check",
            Self::Forbidden => "http-403",
            Self::Network => "network",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for FailureCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Best guess at why yt-dlp failed. `None` for empty stderr.
pub fn classify_failure(stderr: &str) -> Option<FailureCause> {
    if stderr.trim().is_empty() {
        return None;
    }

    let lower = stderr.to_lowercase();
    let cause = RULES
        .iter()
        .find(|(_, needles)| needles.iter().any(|n| lower.contains(n)))
        .map(|(cause, _)| *cause)
        .unwrap_or(FailureCause::Other);
    Some(cause)
}
