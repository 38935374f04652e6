//! Best-effort field extraction from raw SMS bodies.
//!
//! Every extraction is independent and yields `None` when nothing matches.
//! Only the first URL, code and amount in a message are considered.

use crate::lexicon::KNOWN_MERCHANTS;
use crate::message::Message;
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Upper bound on how many characters of a body are scanned by default.
pub const DEFAULT_MAX_SCAN_CHARS: usize = 4096;

lazy_static! {
    static ref URL_REGEX: Regex = Regex::new(r"(?i)https?://\S+").expect("valid url regex");
    static ref LABELED_CODE_REGEX: Regex =
        Regex::new(r"(?i)(?:code|קוד)[\s:]*([A-Z0-9]{4,})").expect("valid labeled code regex");
    // Standalone means delimited by whitespace or the text edges, optionally
    // followed by sentence punctuation. Uppercase only, so ordinary words
    // never qualify.
    static ref STANDALONE_CODE_REGEX: Regex =
        Regex::new(r"(?:^|\s)([A-Z0-9]{6,})[.,!?;:]*(?:\s|$)")
            .expect("valid standalone code regex");
    static ref AMOUNT_REGEX: Regex =
        Regex::new(r"(?i)[0-9]+(?:[.,][0-9]{1,2})?\s*(?:₪|NIS|ILS|\$|USD|EUR|€)")
            .expect("valid amount regex");
}

/// Structured voucher fields pulled out of one message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedData {
    pub merchant_name: Option<String>,
    /// Matched text kept verbatim, e.g. `"100 ₪"`.
    pub amount: Option<String>,
    pub redeem_url: Option<String>,
    pub redeem_code: Option<String>,
    /// The untouched message body.
    pub raw_message: String,
}

pub struct FieldExtractor {
    max_scan_chars: usize,
}

impl Default for FieldExtractor {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_SCAN_CHARS)
    }
}

impl FieldExtractor {
    pub fn new(max_scan_chars: usize) -> Self {
        Self { max_scan_chars }
    }

    /// Prefix of `text` that the extractor and lexicon are allowed to look at.
    pub fn scan_window<'a>(&self, text: &'a str) -> &'a str {
        match text.char_indices().nth(self.max_scan_chars) {
            Some((idx, _)) => {
                log::debug!(
                    "Message body longer than {} chars, scanning prefix only",
                    self.max_scan_chars
                );
                &text[..idx]
            }
            None => text,
        }
    }

    pub fn extract(&self, message: &Message) -> ExtractedData {
        let text = self.scan_window(&message.body);

        ExtractedData {
            merchant_name: Self::extract_merchant(message.sender_name.as_deref(), text),
            amount: Self::extract_amount(text),
            redeem_url: Self::extract_url(text),
            redeem_code: Self::extract_code(text),
            raw_message: message.body.clone(),
        }
    }

    pub fn extract_url(text: &str) -> Option<String> {
        URL_REGEX.find(text).map(|m| m.as_str().to_string())
    }

    /// Labeled code first (`code: XXXX` / `קוד XXXX`), then any standalone run
    /// of six or more letters and digits.
    ///
    /// The labeled stage ignores case. The fallback only takes uppercase runs
    /// and still fires on tracking numbers and order IDs; that looseness is
    /// part of the classifier's current behaviour.
    pub fn extract_code(text: &str) -> Option<String> {
        LABELED_CODE_REGEX
            .captures(text)
            .or_else(|| STANDALONE_CODE_REGEX.captures(text))
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
    }

    pub fn extract_amount(text: &str) -> Option<String> {
        AMOUNT_REGEX.find(text).map(|m| m.as_str().to_string())
    }

    /// A resolved contact name always wins over merchants found in the text.
    pub fn extract_merchant(sender_name: Option<&str>, text: &str) -> Option<String> {
        if let Some(name) = sender_name {
            return Some(name.to_string());
        }

        let text_lower = text.to_lowercase();
        KNOWN_MERCHANTS
            .iter()
            .find(|merchant| text_lower.contains(&merchant.to_lowercase()))
            .map(|merchant| merchant.to_string())
    }
}
