//! Response classification for retry decisions
//!
//! The paginator and session manager do not inspect raw responses; they act
//! on the classification returned here. `RateLimited` is retried with
//! backoff up to a bounded attempt count. `Blocked` is never retried:
//! hammering a site that is already refusing automated traffic only makes
//! the block worse.

use std::fmt;

/// DOM markers of an active anti-automation challenge page
const CHALLENGE_MARKERS: &[&str] = &[
    "validatecaptcha",
    "captchacharacters",
    "enter the characters you see",
    "type the characters you see",
    "robot check",
];

/// DOM markers of a soft throttle page served with a 200 status
const THROTTLE_MARKERS: &[&str] = &[
    "request was throttled",
    "to discuss automated access",
];

/// Classification of one page response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    /// Page is usable
    Normal,

    /// Transient refusal; retry with backoff
    RateLimited,

    /// Hard refusal or challenge page; fatal to the job
    Blocked,
}

impl Signal {
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::RateLimited)
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Normal => "normal",
            Self::RateLimited => "rate_limited",
            Self::Blocked => "blocked",
        };
        write!(f, "{}", name)
    }
}

/// Classifies a response from its HTTP status and body
///
/// The HTTP-level signal wins when present (429/503); otherwise the body is
/// scanned for challenge and throttle indicators, since the target site
/// serves both kinds of refusal with a 200 status.
pub fn classify(status: u16, body: &str) -> Signal {
    if status == 429 || status == 503 {
        return Signal::RateLimited;
    }

    let lowered = body.to_lowercase();
    if challenge_indicator(&lowered).is_some() {
        return Signal::Blocked;
    }
    if THROTTLE_MARKERS.iter().any(|m| lowered.contains(m)) {
        return Signal::RateLimited;
    }

    Signal::Normal
}

/// Returns the first challenge marker present in the (lowercased) body
///
/// Shared with the session manager, which reports a challenge during login
/// as `AuthChallenge` rather than `Blocked`.
pub fn challenge_indicator(lowered_body: &str) -> Option<&'static str> {
    CHALLENGE_MARKERS
        .iter()
        .find(|m| lowered_body.contains(*m))
        .copied()
}
