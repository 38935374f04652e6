//! Built-in term sets for voucher classification.
//!
//! The lists mix Hebrew and English phrases. Matching folds case with a plain
//! `to_lowercase`, which only affects the Latin entries.

/// Phrases that indicate an actual monetary voucher or gift card.
pub static STRONG_VOUCHER_TERMS: &[&str] = &[
    // Hebrew
    "שובר",
    "שובר דיגיטלי",
    "שובר מתנה",
    "קיבלת שובר",
    "כרטיס מתנה",
    "כרטיס נטען",
    "גיפט קארד",
    "גיפטקארד",
    "תו קנייה",
    "תו שי",
    "הוטען לכרטיס",
    "זיכוי כספי",
    // English
    "voucher",
    "e-voucher",
    "gift card",
    "giftcard",
    "gift voucher",
    "store credit",
    "has been loaded",
];

/// Phrases that indicate marketing or promotional content.
pub static COUPON_PROMO_TERMS: &[&str] = &[
    // Hebrew
    "מבצע",
    "קופון",
    "הנחה",
    "הנחות",
    "מהרו",
    "חד פעמי",
    "לזמן מוגבל",
    "אל תפספסו",
    "בלעדי",
    "סייל",
    "להסרה",
    // English
    "sale",
    "discount",
    "% off",
    "coupon",
    "promo",
    "limited time",
    "special offer",
    "shop now",
    "unsubscribe",
];

/// Redemption portals whose links count as a voucher access point.
pub static TRUSTED_VOUCHER_DOMAINS: &[&str] = &[
    "cibus.pluxee.co.il",
    "myconsumers.pluxee.co.il",
    "pluxee.co.il",
    "sodexo.co.il",
    "10bis.co.il",
    "buyme.co.il",
    "multipass.co.il",
    "tavhazahav.co.il",
    "giftcard.co.il",
];

/// Merchants recognised in message bodies. Order is the tie-break when
/// several entries occur in the same text.
pub static KNOWN_MERCHANTS: &[&str] = &[
    "Cibus",
    "Pluxee",
    "10bis",
    "תן ביס",
    "BuyMe",
    "ביימי",
    "Multipass",
    "מולטיפס",
    "Shufersal",
    "שופרסל",
    "Rami Levy",
    "רמי לוי",
    "Yochananof",
    "יוחננוף",
    "Victory",
    "ויקטורי",
    "Super-Pharm",
    "סופר-פארם",
    "IKEA",
    "איקאה",
];

/// Read-only predicates over the built-in term sets.
pub struct LexiconStore;

impl LexiconStore {
    /// True if any term occurs in `text`, ignoring case.
    pub fn contains_any_term(text: &str, terms: &[&str]) -> bool {
        let text_lower = text.to_lowercase();
        terms
            .iter()
            .any(|term| text_lower.contains(&term.to_lowercase()))
    }

    /// True if the lowercased URL contains a built-in or caller-supplied domain.
    ///
    /// This is a substring test, so a domain inside the path or query string
    /// also counts.
    pub fn contains_trusted_domain(url: &str, extra_domains: &[String]) -> bool {
        let url_lower = url.to_lowercase();

        if TRUSTED_VOUCHER_DOMAINS
            .iter()
            .any(|domain| url_lower.contains(domain))
        {
            return true;
        }

        extra_domains
            .iter()
            .map(|domain| domain.trim().to_lowercase())
            .filter(|domain| !domain.is_empty())
            .any(|domain| url_lower.contains(&domain))
    }

    pub fn has_strong_voucher_term(text: &str) -> bool {
        Self::contains_any_term(text, STRONG_VOUCHER_TERMS)
    }

    pub fn has_coupon_promo_term(text: &str) -> bool {
        Self::contains_any_term(text, COUPON_PROMO_TERMS)
    }
}
