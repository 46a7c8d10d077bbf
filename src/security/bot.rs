//! Header-based bot heuristics.
//!
//! # Responsibilities
//! - Classify a request as automated from its identity headers alone
//! - Evaluate rules in a fixed order so outcomes are deterministic
//!
//! # Design Decisions
//! - Pure function of the identity; no shared state
//! - Deny/allow lists come from configuration, compiled once at startup
//! - Referer matching is substring-based against configured site origins;
//!   the literal value "direct" is the form's own marker and passes

use regex::{RegexSet, RegexSetBuilder};

use crate::config::schema::BotConfig;
use crate::http::request::ClientIdentity;

/// Why a request was classified as a bot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BotReason {
    MissingUserAgent,
    SuspiciousUserAgent,
    DirectApiAccess,
}

impl BotReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            BotReason::MissingUserAgent => "Missing user agent",
            BotReason::SuspiciousUserAgent => "Suspicious user agent",
            BotReason::DirectApiAccess => "Direct API access",
        }
    }
}

/// Stateless classifier over identity headers.
pub struct BotDetector {
    user_agent_deny: RegexSet,
    referer_allow: Vec<String>,
}

impl BotDetector {
    pub fn new(config: &BotConfig) -> Result<Self, regex::Error> {
        Ok(Self {
            user_agent_deny: RegexSetBuilder::new(&config.user_agent_deny)
                .case_insensitive(true)
                .build()?,
            referer_allow: config.referer_allow.clone(),
        })
    }

    /// First matching rule wins; `None` means not a bot.
    pub fn classify(&self, identity: &ClientIdentity) -> Option<BotReason> {
        if identity.user_agent.is_empty() {
            return Some(BotReason::MissingUserAgent);
        }

        if self.user_agent_deny.is_match(&identity.user_agent) {
            return Some(BotReason::SuspiciousUserAgent);
        }

        let referer = identity.referer.as_str();
        if referer != "direct" && !self.referer_allow.iter().any(|origin| referer.contains(origin)) {
            return Some(BotReason::DirectApiAccess);
        }

        None
    }
}
