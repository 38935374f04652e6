//! Hand-off of classification results to persistence and notifications.

use crate::config::Config;
use crate::decision::{Classifier, Decision, Evaluation};
use crate::extractor::{ExtractedData, FieldExtractor};
use crate::message::Message;
use crate::sender::ApprovedSenders;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoucherStatus {
    Approved,
    Pending,
}

impl VoucherStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VoucherStatus::Approved => "approved",
            VoucherStatus::Pending => "pending",
        }
    }
}

/// Stored form of an approved or pending voucher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoucherRecord {
    pub status: VoucherStatus,
    pub sender_phone: String,
    pub sender_name: Option<String>,
    pub received_at_ms: i64,
    #[serde(flatten)]
    pub data: ExtractedData,
}

impl VoucherRecord {
    /// `None` for discarded messages, which are never stored.
    pub fn from_decision(message: &Message, decision: &Decision) -> Option<Self> {
        let (status, data) = match decision {
            Decision::Approved(data) => (VoucherStatus::Approved, data),
            Decision::Pending(data) => (VoucherStatus::Pending, data),
            Decision::Discard => return None,
        };

        Some(Self {
            status,
            sender_phone: message.sender_phone.clone(),
            sender_name: message.sender_name.clone(),
            received_at_ms: message.received_at_ms,
            data: data.clone(),
        })
    }
}

pub trait VoucherStore {
    fn save(&mut self, record: VoucherRecord) -> anyhow::Result<()>;
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    pub records: Vec<VoucherRecord>,
}

impl VoucherStore for MemoryStore {
    fn save(&mut self, record: VoucherRecord) -> anyhow::Result<()> {
        self.records.push(record);
        Ok(())
    }
}

/// An absent store drops records, so callers can make persistence optional.
impl<S: VoucherStore> VoucherStore for Option<S> {
    fn save(&mut self, record: VoucherRecord) -> anyhow::Result<()> {
        match self {
            Some(store) => store.save(record),
            None => {
                log::debug!("No store attached, dropping {} record", record.status.as_str());
                Ok(())
            }
        }
    }
}

/// Appends one JSON object per line.
pub struct JsonLinesStore {
    path: PathBuf,
}

impl JsonLinesStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn load(&self) -> anyhow::Result<Vec<VoucherRecord>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let content = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read store: {}", self.path.display()))?;

        content
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(i, line)| {
                serde_json::from_str(line).with_context(|| {
                    format!("Invalid record on line {} of {}", i + 1, self.path.display())
                })
            })
            .collect()
    }
}

impl VoucherStore for JsonLinesStore {
    fn save(&mut self, record: VoucherRecord) -> anyhow::Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create store directory: {}", parent.display())
            })?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("Failed to open store: {}", self.path.display()))?;

        let line = serde_json::to_string(&record)?;
        writeln!(file, "{line}")?;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    VoucherApproved { merchant: Option<String> },
    PendingReview,
}

impl Notification {
    pub fn for_decision(decision: &Decision) -> Option<Self> {
        match decision {
            Decision::Approved(data) => Some(Notification::VoucherApproved {
                merchant: data.merchant_name.clone(),
            }),
            Decision::Pending(_) => Some(Notification::PendingReview),
            Decision::Discard => None,
        }
    }

    pub fn text(&self) -> String {
        match self {
            Notification::VoucherApproved {
                merchant: Some(merchant),
            } => format!("Voucher approved: {merchant}"),
            Notification::VoucherApproved { merchant: None } => "Voucher approved".to_string(),
            Notification::PendingReview => "New voucher pending review".to_string(),
        }
    }
}

pub trait Notifier {
    fn notify(&self, notification: &Notification);
}

pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, notification: &Notification) {
        log::info!("{}", notification.text());
    }
}

/// Classify one message and route the result to storage and notifications.
pub struct Pipeline<S: VoucherStore, N: Notifier> {
    classifier: Classifier,
    approved_senders: ApprovedSenders,
    trusted_domains: Vec<String>,
    store: S,
    notifier: N,
}

impl<S: VoucherStore, N: Notifier> Pipeline<S, N> {
    pub fn new(
        classifier: Classifier,
        approved_senders: ApprovedSenders,
        trusted_domains: Vec<String>,
        store: S,
        notifier: N,
    ) -> Self {
        Self {
            classifier,
            approved_senders,
            trusted_domains,
            store,
            notifier,
        }
    }

    pub fn from_config(config: &Config, store: S, notifier: N) -> Self {
        Self::new(
            Classifier::new(FieldExtractor::new(config.extraction.max_scan_chars)),
            config.approved_senders.clone(),
            config.trusted_domains.clone(),
            store,
            notifier,
        )
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn process(&mut self, message: &Message) -> anyhow::Result<Decision> {
        let decision = self.evaluate(message, false).decision;
        self.route(message, &decision)?;
        Ok(decision)
    }

    /// Classify without side effects. `approved_override` marks the sender as
    /// approved regardless of the configured list.
    pub fn evaluate(&self, message: &Message, approved_override: bool) -> Evaluation {
        let is_approved = approved_override || self.approved_senders.is_approved(message);
        self.classifier
            .evaluate(message, is_approved, &self.trusted_domains)
    }

    /// Store and notify for approved or pending decisions. Discard is silent.
    pub fn route(&mut self, message: &Message, decision: &Decision) -> anyhow::Result<()> {
        if let Some(record) = VoucherRecord::from_decision(message, decision) {
            log::info!(
                "Routing {} voucher from {}",
                record.status.as_str(),
                record.sender_phone
            );
            self.store.save(record)?;
        }

        if let Some(notification) = Notification::for_decision(decision) {
            self.notifier.notify(&notification);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[derive(Default)]
    struct RecordingNotifier {
        sent: RefCell<Vec<Notification>>,
    }

    impl Notifier for &RecordingNotifier {
        fn notify(&self, notification: &Notification) {
            self.sent.borrow_mut().push(notification.clone());
        }
    }

    fn config() -> Config {
        let mut config = Config::default();
        config.approved_senders.add_phone("0542199006");
        config
    }

    #[test]
    fn test_approved_voucher_is_stored_and_notified() {
        let notifier = RecordingNotifier::default();
        let mut pipeline = Pipeline::from_config(&config(), MemoryStore::default(), &notifier);

        let message = Message::new("+972-54-219-9006", "קיבלת שובר מתנה! קוד: ABCD1234")
            .with_timestamp(42);
        let decision = pipeline.process(&message).unwrap();

        assert!(matches!(decision, Decision::Approved(_)));
        let records = &pipeline.store().records;
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].status, VoucherStatus::Approved);
        assert_eq!(records[0].received_at_ms, 42);
        assert_eq!(records[0].data.redeem_code.as_deref(), Some("ABCD1234"));
        assert_eq!(
            *notifier.sent.borrow(),
            vec![Notification::VoucherApproved { merchant: None }]
        );
    }

    #[test]
    fn test_unknown_sender_goes_to_pending() {
        let notifier = RecordingNotifier::default();
        let mut pipeline = Pipeline::from_config(&config(), MemoryStore::default(), &notifier);

        let message = Message::new("0501111111", "קיבלת שובר מתנה! קוד: ABCD1234");
        pipeline.process(&message).unwrap();

        assert_eq!(pipeline.store().records[0].status, VoucherStatus::Pending);
        assert_eq!(*notifier.sent.borrow(), vec![Notification::PendingReview]);
    }

    #[test]
    fn test_discard_is_silent() {
        let notifier = RecordingNotifier::default();
        let mut pipeline = Pipeline::from_config(&config(), MemoryStore::default(), &notifier);

        let message = Message::new("0542199006", "מבצע חד פעמי! קוד קופון SALE20 בלבד היום, מהרו!");
        assert_eq!(pipeline.process(&message).unwrap(), Decision::Discard);
        assert!(pipeline.store().records.is_empty());
        assert!(notifier.sent.borrow().is_empty());
    }

    #[test]
    fn test_config_trusted_domains_are_used() {
        let mut config = config();
        config.trusted_domains.push("vouchers.example.com".to_string());
        let mut pipeline = Pipeline::from_config(&config, MemoryStore::default(), LogNotifier);

        let message = Message::new("0542199006", "שובר מחכה לך: https://vouchers.example.com/v/9");
        assert!(matches!(
            pipeline.process(&message).unwrap(),
            Decision::Approved(_)
        ));
    }

    #[test]
    fn test_notification_text() {
        let approved = Notification::VoucherApproved {
            merchant: Some("BuyMe".to_string()),
        };
        assert_eq!(approved.text(), "Voucher approved: BuyMe");
        assert_eq!(
            Notification::PendingReview.text(),
            "New voucher pending review"
        );
    }

    #[test]
    fn test_json_lines_store_appends() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("vouchers.jsonl");
        let mut store = JsonLinesStore::new(&path);
        assert!(store.load().unwrap().is_empty());

        let message = Message::new("0542199006", "קיבלת שובר מתנה! קוד: ABCD1234")
            .with_sender_name("BuyMe");
        let decision = crate::decision::classify(&message, false, &[]);
        let record = VoucherRecord::from_decision(&message, &decision).unwrap();

        store.save(record.clone()).unwrap();
        store.save(record.clone()).unwrap();

        let loaded = store.load().unwrap();
        assert_eq!(loaded, vec![record.clone(), record]);

        let first_line = std::fs::read_to_string(&path).unwrap();
        let json: serde_json::Value =
            serde_json::from_str(first_line.lines().next().unwrap()).unwrap();
        assert_eq!(json["status"], "pending");
        assert_eq!(json["merchant_name"], "BuyMe");
    }

    #[test]
    fn test_load_reports_physical_line_number() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vouchers.jsonl");
        std::fs::write(&path, "\n\nnot json\n").unwrap();

        let err = JsonLinesStore::new(&path).load().unwrap_err();
        assert!(format!("{err:#}").contains("line 3"), "{err:#}");
    }

    #[test]
    fn test_missing_store_drops_records() {
        let notifier = RecordingNotifier::default();
        let mut pipeline =
            Pipeline::from_config(&config(), None::<MemoryStore>, &notifier);

        let message = Message::new("0542199006", "קיבלת שובר מתנה! קוד: ABCD1234");
        assert!(matches!(
            pipeline.process(&message).unwrap(),
            Decision::Approved(_)
        ));
        assert!(pipeline.store().is_none());
        assert_eq!(notifier.sent.borrow().len(), 1);
    }

    #[test]
    fn test_approved_override() {
        let mut pipeline =
            Pipeline::from_config(&config(), MemoryStore::default(), LogNotifier);

        let message = Message::new("0501111111", "קיבלת שובר מתנה! קוד: ABCD1234");
        let evaluation = pipeline.evaluate(&message, true);
        assert!(matches!(evaluation.decision, Decision::Approved(_)));

        pipeline.route(&message, &evaluation.decision).unwrap();
        assert_eq!(pipeline.store().records[0].status, VoucherStatus::Approved);

        assert!(matches!(
            pipeline.evaluate(&message, false).decision,
            Decision::Pending(_)
        ));
    }

    #[test]
    fn test_discard_has_no_record() {
        let message = Message::new("0542199006", "");
        assert!(VoucherRecord::from_decision(&message, &Decision::Discard).is_none());
    }
}
