pub mod config;
pub mod decision;
pub mod dispatch;
pub mod extractor;
pub mod lexicon;
pub mod message;
pub mod phone;
pub mod sender;

pub use config::Config;
pub use decision::{classify, Classifier, Decision, Evaluation, Signals};
pub use dispatch::{JsonLinesStore, LogNotifier, Notifier, Pipeline, VoucherRecord, VoucherStore};
pub use extractor::{ExtractedData, FieldExtractor};
pub use lexicon::LexiconStore;
pub use message::Message;
pub use sender::ApprovedSenders;
