//! Decision engine.
//!
//! Combines lexicon signals, extracted fields and the caller-resolved sender
//! trust into one of three outcomes. Rules are evaluated in a fixed order and
//! the first match wins; the promotional pre-filter runs before any sender
//! check.

use crate::extractor::{ExtractedData, FieldExtractor};
use crate::lexicon::LexiconStore;
use crate::message::Message;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Final classification of a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "data", rename_all = "lowercase")]
pub enum Decision {
    /// Accepted automatically.
    Approved(ExtractedData),
    /// Held for manual review.
    Pending(ExtractedData),
    Discard,
}

impl Decision {
    pub fn extracted(&self) -> Option<&ExtractedData> {
        match self {
            Decision::Approved(data) | Decision::Pending(data) => Some(data),
            Decision::Discard => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Decision::Approved(_) => "approved",
            Decision::Pending(_) => "pending",
            Decision::Discard => "discard",
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Boolean inputs to the rule list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signals {
    pub is_approved_sender: bool,
    pub has_url: bool,
    pub has_trusted_voucher_domain: bool,
    pub has_redeem_code: bool,
    pub has_strong_voucher_word: bool,
    pub has_coupon_promo_word: bool,
}

impl Signals {
    /// Only a trusted-domain link or a redemption code lets a voucher be
    /// redeemed. An untrusted link does not count.
    pub fn has_access_point(&self) -> bool {
        self.has_trusted_voucher_domain || self.has_redeem_code
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Approve,
    HoldForReview,
    Discard,
}

struct DecisionRule {
    name: &'static str,
    applies: fn(&Signals) -> bool,
    outcome: Outcome,
}

static RULES: [DecisionRule; 4] = [
    DecisionRule {
        name: "promo-without-voucher-language",
        applies: |s| s.has_coupon_promo_word && !s.has_strong_voucher_word,
        outcome: Outcome::Discard,
    },
    DecisionRule {
        name: "approved-sender-voucher",
        applies: |s| s.is_approved_sender && s.has_strong_voucher_word && s.has_access_point(),
        outcome: Outcome::Approve,
    },
    DecisionRule {
        name: "unknown-sender-voucher",
        applies: |s| !s.is_approved_sender && s.has_strong_voucher_word && s.has_access_point(),
        outcome: Outcome::HoldForReview,
    },
    DecisionRule {
        name: "fallthrough",
        applies: |_| true,
        outcome: Outcome::Discard,
    },
];

/// Full result of one classification, for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Evaluation {
    pub signals: Signals,
    pub rule: String,
    pub decision: Decision,
}

pub struct Classifier {
    extractor: FieldExtractor,
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new(FieldExtractor::default())
    }
}

impl Classifier {
    pub fn new(extractor: FieldExtractor) -> Self {
        Self { extractor }
    }

    pub fn classify(
        &self,
        message: &Message,
        is_approved_sender: bool,
        extra_trusted_domains: &[String],
    ) -> Decision {
        self.evaluate(message, is_approved_sender, extra_trusted_domains)
            .decision
    }

    pub fn evaluate(
        &self,
        message: &Message,
        is_approved_sender: bool,
        extra_trusted_domains: &[String],
    ) -> Evaluation {
        let extracted = self.extractor.extract(message);
        let text = self.extractor.scan_window(&message.body);

        let has_trusted_voucher_domain = extracted
            .redeem_url
            .as_deref()
            .is_some_and(|url| LexiconStore::contains_trusted_domain(url, extra_trusted_domains));

        let signals = Signals {
            is_approved_sender,
            has_url: extracted.redeem_url.is_some(),
            has_trusted_voucher_domain,
            has_redeem_code: extracted.redeem_code.is_some(),
            has_strong_voucher_word: LexiconStore::has_strong_voucher_term(text),
            has_coupon_promo_word: LexiconStore::has_coupon_promo_term(text),
        };

        // The last rule always applies, so a rule is always found.
        let rule = RULES
            .iter()
            .find(|rule| (rule.applies)(&signals))
            .unwrap_or(&RULES[RULES.len() - 1]);

        log::debug!(
            "Classified message from {}: rule={} signals={:?}",
            message.sender_phone,
            rule.name,
            signals
        );

        let decision = match rule.outcome {
            Outcome::Approve => Decision::Approved(extracted),
            Outcome::HoldForReview => Decision::Pending(extracted),
            Outcome::Discard => Decision::Discard,
        };

        Evaluation {
            signals,
            rule: rule.name.to_string(),
            decision,
        }
    }
}

/// Classify with the default extractor settings.
pub fn classify(
    message: &Message,
    is_approved_sender: bool,
    extra_trusted_domains: &[String],
) -> Decision {
    Classifier::default().classify(message, is_approved_sender, extra_trusted_domains)
}
